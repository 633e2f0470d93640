//! Unbound expressions, as handed over by a parser.

use smol_str::SmolStr;
use sqlscope_common::path::Path;
use sqlscope_common::value::CellValue;

/// An expression whose free references are still names.
///
/// An empty `table` means the reference is not qualified by a table name.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(CellValue),
    Column {
        table: SmolStr,
        path: Path,
    },
    /// `prefix*`, optionally renamed as `prefix* AS rename*`.
    Wildcard {
        table: SmolStr,
        prefix: Path,
        rename: Option<Path>,
    },
    /// A bound parameter, `$name`.
    Parameter(SmolStr),
    Function {
        table: SmolStr,
        name: SmolStr,
        args: Vec<Expr>,
    },
}

impl Expr {
    #[inline]
    pub fn constant(value: impl Into<CellValue>) -> Self {
        Self::Constant(value.into())
    }

    #[inline]
    pub fn column(path: impl Into<Path>) -> Self {
        Self::Column {
            table: SmolStr::default(),
            path: path.into(),
        }
    }

    #[inline]
    pub fn qualified_column(table: impl Into<SmolStr>, path: impl Into<Path>) -> Self {
        Self::Column {
            table: table.into(),
            path: path.into(),
        }
    }

    /// `*`
    #[inline]
    pub fn wildcard() -> Self {
        Self::prefixed_wildcard(Path::root())
    }

    #[inline]
    pub fn prefixed_wildcard(prefix: impl Into<Path>) -> Self {
        Self::Wildcard {
            table: SmolStr::default(),
            prefix: prefix.into(),
            rename: None,
        }
    }

    #[inline]
    pub fn parameter(name: impl Into<SmolStr>) -> Self {
        Self::Parameter(name.into())
    }

    #[inline]
    pub fn function(name: impl Into<SmolStr>, args: Vec<Expr>) -> Self {
        Self::Function {
            table: SmolStr::default(),
            name: name.into(),
            args,
        }
    }
}
