use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Optional link to the issue tracking a missing feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingIssue(Option<u32>);

impl From<Option<u32>> for TrackingIssue {
    fn from(issue: Option<u32>) -> Self {
        Self(issue)
    }
}

impl fmt::Display for TrackingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repo = env!("CARGO_PKG_REPOSITORY");
        match self.0 {
            Some(issue) => write!(f, "see {repo}/issues/{issue} for progress"),
            None => write!(f, "not tracked yet; issues can be filed at {repo}/issues"),
        }
    }
}

/// Raised when a request reaches a capability that exists in the grammar but has no
/// implementation in this engine yet.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("not implemented: {feature}")]
pub struct NotImplemented {
    feature: String,
    #[help]
    issue: TrackingIssue,
}

impl NotImplemented {
    #[inline]
    pub fn new(feature: String, issue: TrackingIssue) -> Self {
        Self { feature, issue }
    }

    #[inline]
    pub fn feature(&self) -> &str {
        &self.feature
    }
}

#[inline]
pub fn not_implemented<T, E>(feature: impl Into<String>, issue: Option<u32>) -> Result<T, E>
where
    E: From<NotImplemented>,
{
    Err(E::from(NotImplemented::new(feature.into(), issue.into())))
}
