use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The logical timestamp attached to every atom of an [`ExpressionValue`].
///
/// Values computed from nothing in particular (constants, column names) carry
/// [`Timestamp::NegativeInfinity`], so that they never win a "latest value" comparison.
///
/// [`ExpressionValue`]: crate::value::ExpressionValue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timestamp {
    NegativeInfinity,
    At(DateTime<Utc>),
    PositiveInfinity,
}

impl Timestamp {
    #[inline]
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self::At)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    #[inline]
    fn from(value: DateTime<Utc>) -> Self {
        Self::At(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeInfinity => write!(f, "-inf"),
            Self::At(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::PositiveInfinity => write!(f, "+inf"),
        }
    }
}
