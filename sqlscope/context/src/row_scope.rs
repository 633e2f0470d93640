//! Per-evaluation contexts handed to bound closures.
//!
//! A [`RowScope`] is a stack of typed layers, one per binding scope between the expression
//! and the root. Each scope knows which layer it produced and downcasts to it with one of the
//! `as_*` methods; asking for the wrong layer is a bug in the binder and panics.

use std::fmt;

use sqlscope_common::path::Path;
use sqlscope_common::timestamp::Timestamp;
use sqlscope_common::value::ExpressionValue;

/// Looks up the value bound to a named query parameter.
pub type ParamLookup<'a> = dyn Fn(&str) -> ExpressionValue + Send + Sync + 'a;

#[derive(Clone, Copy)]
pub enum RowScope<'a> {
    /// No row is available, e.g. when evaluating constant function calls.
    Empty,
    Table(TableRow<'a>),
    ReadThrough(ReadThroughRow<'a>),
    When(WhenRow<'a>),
    Column(ColumnRow<'a>),
    Params(ParamsRow<'a>),
    Extract(ExtractRow<'a>),
}

/// A row read from a dataset.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    pub row: &'a ExpressionValue,
}

/// A layer whose only content is the enclosing layer.
#[derive(Debug, Clone, Copy)]
pub struct ReadThroughRow<'a> {
    pub outer: &'a RowScope<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct WhenRow<'a> {
    pub base: ReadThroughRow<'a>,
    pub ts: Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRow<'a> {
    pub column_name: &'a Path,
}

#[derive(Clone, Copy)]
pub struct ParamsRow<'a> {
    pub params: &'a ParamLookup<'a>,
}

impl fmt::Debug for ParamsRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsRow").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractRow<'a> {
    pub input: &'a ExpressionValue,
}

#[cold]
#[track_caller]
fn layer_mismatch(expected: &str, actual: &RowScope<'_>) -> ! {
    panic!(
        "row scope layer mismatch: expected {expected}, found {}",
        actual.kind()
    )
}

impl<'a> RowScope<'a> {
    #[inline]
    pub fn table(row: &'a ExpressionValue) -> Self {
        Self::Table(TableRow { row })
    }

    #[inline]
    pub fn read_through(outer: &'a RowScope<'a>) -> Self {
        Self::ReadThrough(ReadThroughRow { outer })
    }

    #[inline]
    pub fn when(outer: &'a RowScope<'a>, ts: Timestamp) -> Self {
        Self::When(WhenRow {
            base: ReadThroughRow { outer },
            ts,
        })
    }

    #[inline]
    pub fn column(column_name: &'a Path) -> Self {
        Self::Column(ColumnRow { column_name })
    }

    #[inline]
    pub fn params(params: &'a ParamLookup<'a>) -> Self {
        Self::Params(ParamsRow { params })
    }

    #[inline]
    pub fn extract(input: &'a ExpressionValue) -> Self {
        Self::Extract(ExtractRow { input })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Table(_) => "table",
            Self::ReadThrough(_) => "read-through",
            Self::When(_) => "when",
            Self::Column(_) => "column",
            Self::Params(_) => "params",
            Self::Extract(_) => "extract",
        }
    }

    /// Returns `false` only for [`RowScope::Empty`].
    #[inline]
    pub fn has_row(&self) -> bool {
        !matches!(self, Self::Empty)
    }

    #[track_caller]
    pub fn as_table(&self) -> &TableRow<'a> {
        match self {
            Self::Table(row) => row,
            other => layer_mismatch("table", other),
        }
    }

    /// Downcasts to a layer that carries an enclosing layer. `When` layers qualify since
    /// they extend the read-through layer.
    #[track_caller]
    pub fn as_read_through(&self) -> &ReadThroughRow<'a> {
        match self {
            Self::ReadThrough(row) => row,
            Self::When(row) => &row.base,
            other => layer_mismatch("read-through", other),
        }
    }

    /// The enclosing layer, one step outward.
    #[inline]
    #[track_caller]
    pub fn outer(&self) -> &'a RowScope<'a> {
        self.as_read_through().outer
    }

    #[track_caller]
    pub fn as_when(&self) -> &WhenRow<'a> {
        match self {
            Self::When(row) => row,
            other => layer_mismatch("when", other),
        }
    }

    #[track_caller]
    pub fn as_column(&self) -> &ColumnRow<'a> {
        match self {
            Self::Column(row) => row,
            other => layer_mismatch("column", other),
        }
    }

    #[track_caller]
    pub fn as_params(&self) -> &ParamsRow<'a> {
        match self {
            Self::Params(row) => row,
            other => layer_mismatch("params", other),
        }
    }

    #[track_caller]
    pub fn as_extract(&self) -> &ExtractRow<'a> {
        match self {
            Self::Extract(row) => row,
            other => layer_mismatch("extract", other),
        }
    }
}

impl fmt::Debug for RowScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Table(row) => fmt::Debug::fmt(row, f),
            Self::ReadThrough(row) => fmt::Debug::fmt(row, f),
            Self::When(row) => fmt::Debug::fmt(row, f),
            Self::Column(row) => fmt::Debug::fmt(row, f),
            Self::Params(row) => fmt::Debug::fmt(row, f),
            Self::Extract(row) => fmt::Debug::fmt(row, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_chain() {
        let value = ExpressionValue::atom(1, Timestamp::NegativeInfinity);
        let root = RowScope::table(&value);
        let first = RowScope::read_through(&root);
        let ts = Timestamp::from_millis(5).unwrap();
        let second = RowScope::when(&first, ts);

        assert_eq!(second.as_when().ts, ts);
        assert_eq!(second.outer().kind(), "read-through");
        assert_eq!(second.outer().outer().as_table().row, &value);
        assert!(second.has_row());
        assert!(!RowScope::Empty.has_row());
    }

    #[test]
    fn test_params_lookup() {
        let lookup = |name: &str| ExpressionValue::atom(name, Timestamp::NegativeInfinity);
        let scope = RowScope::params(&lookup);
        let value = (scope.as_params().params)("limit");
        assert_eq!(value, ExpressionValue::atom("limit", Timestamp::NegativeInfinity));
    }

    #[test]
    #[should_panic(expected = "expected extract, found column")]
    fn test_layer_mismatch_panics() {
        let name = Path::parse("x");
        RowScope::column(&name).as_extract();
    }
}
