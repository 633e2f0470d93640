use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smol_str::SmolStr;

/// A single segment of a column path.
pub type PathElement = SmolStr;

/// An ordered sequence of name segments identifying a (possibly nested) field.
///
/// Column references are always non-empty. The empty path is only used as the root prefix of
/// a structural walk over a value.
///
/// # Examples
/// ```
/// # use sqlscope_common::path::Path;
/// let path = Path::parse("a.b.c");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.head().unwrap(), "a");
/// assert_eq!(path.tail().to_string(), "b.c");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path(SmallVec<[PathElement; 4]>);

impl Path {
    /// The empty path.
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    /// Splits a dotted name into segments. Empty segments are skipped.
    pub fn parse(dotted: &str) -> Self {
        dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(PathElement::from)
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn head(&self) -> Option<&PathElement> {
        self.0.first()
    }

    /// Returns every segment after the first one.
    #[inline]
    pub fn tail(&self) -> Path {
        self.0.iter().skip(1).cloned().collect()
    }

    #[inline]
    pub fn segments(&self) -> &[PathElement] {
        &self.0
    }

    #[inline]
    pub fn push(&mut self, element: impl Into<PathElement>) {
        self.0.push(element.into());
    }

    #[inline]
    pub fn pop(&mut self) -> Option<PathElement> {
        self.0.pop()
    }

    /// Returns a new path with `element` appended.
    #[inline]
    pub fn child(&self, element: impl Into<PathElement>) -> Path {
        let mut path = self.clone();
        path.push(element);
        path
    }

    /// Returns `self` followed by all segments of `other`.
    pub fn concat(&self, other: &Path) -> Path {
        self.0.iter().chain(other.0.iter()).cloned().collect()
    }

    #[inline]
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Removes `prefix` from the front of the path, if present.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        self.starts_with(prefix)
            .then(|| self.0[prefix.len()..].iter().cloned().collect())
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<PathElement> for Path {
    #[inline]
    fn from(value: PathElement) -> Self {
        Self(smallvec::smallvec![value])
    }
}

impl From<&str> for Path {
    #[inline]
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<Vec<PathElement>> for Path {
    #[inline]
    fn from(value: Vec<PathElement>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted = self.0.iter().map(|s| {
            if s.contains('.') || s.is_empty() {
                format!("\"{s}\"")
            } else {
                s.to_string()
            }
        });
        write!(f, "{}", quoted.format("."))
    }
}
