use std::fmt;
use std::sync::{Arc, LazyLock};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::path::Path;

pub type ValueInfoRef = Arc<ValueInfo>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    Boolean,
    Integer,
    Float,
    String,
    Timestamp,
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomType::Boolean => write!(f, "boolean"),
            AtomType::Integer => write!(f, "integer"),
            AtomType::Float => write!(f, "float"),
            AtomType::String => write!(f, "string"),
            AtomType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Whether a row shape may hold columns beyond the declared ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaCompleteness {
    /// Only the declared columns exist.
    Closed,
    /// Undeclared columns may show up at runtime.
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnSparsity {
    Dense,
    Sparse,
}

/// Static description of a value, computed at bind time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueInfo {
    /// Nothing is known about the value.
    Any,
    Atom(AtomType),
    Row(RowValueInfo),
}

impl ValueInfo {
    /// A shared [`ValueInfo::Any`].
    pub fn any() -> ValueInfoRef {
        static ANY: LazyLock<ValueInfoRef> = LazyLock::new(|| Arc::new(ValueInfo::Any));
        ANY.clone()
    }

    #[inline]
    pub fn atom(ty: AtomType) -> ValueInfoRef {
        Arc::new(ValueInfo::Atom(ty))
    }

    /// An open row with no declared columns.
    pub fn unknown_row() -> ValueInfoRef {
        Arc::new(ValueInfo::Row(RowValueInfo::unknown()))
    }

    #[inline]
    pub fn as_row(&self) -> Option<&RowValueInfo> {
        match self {
            ValueInfo::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Views any value description as a row shape.
    ///
    /// Rows are returned as is and anything unknown becomes an open row. An atom has no
    /// columns at all, so it becomes a closed empty row.
    pub fn to_row(&self) -> RowValueInfo {
        match self {
            ValueInfo::Row(row) => row.clone(),
            ValueInfo::Any => RowValueInfo::unknown(),
            ValueInfo::Atom(_) => RowValueInfo::new(vec![], SchemaCompleteness::Closed),
        }
    }
}

impl fmt::Display for ValueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueInfo::Any => write!(f, "any"),
            ValueInfo::Atom(ty) => write!(f, "{ty}"),
            ValueInfo::Row(row) => write!(f, "{row}"),
        }
    }
}

/// A declared column of a row shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownColumn {
    pub path: Path,
    pub info: ValueInfoRef,
    pub sparsity: ColumnSparsity,
}

impl KnownColumn {
    #[inline]
    pub fn new(path: impl Into<Path>, info: ValueInfoRef, sparsity: ColumnSparsity) -> Self {
        Self {
            path: path.into(),
            info,
            sparsity,
        }
    }
}

impl fmt::Display for KnownColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.sparsity {
            ColumnSparsity::Dense => "",
            ColumnSparsity::Sparse => "?",
        };
        write!(f, "{}{marker}: {}", self.path, self.info)
    }
}

/// The shape of a row: its known columns and whether others may exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowValueInfo {
    columns: Vec<KnownColumn>,
    completeness: SchemaCompleteness,
}

impl RowValueInfo {
    #[inline]
    pub fn new(columns: Vec<KnownColumn>, completeness: SchemaCompleteness) -> Self {
        Self {
            columns,
            completeness,
        }
    }

    #[inline]
    pub fn unknown() -> Self {
        Self::new(vec![], SchemaCompleteness::Open)
    }

    #[inline]
    pub fn known_columns(&self) -> &[KnownColumn] {
        &self.columns
    }

    #[inline]
    pub fn schema_completeness(&self) -> SchemaCompleteness {
        self.completeness
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.completeness == SchemaCompleteness::Closed
    }

    /// Locates the description of a possibly nested column.
    ///
    /// An exact match on a known column's path wins; otherwise the search descends into any
    /// known row-valued column whose path is a prefix of `path`.
    pub fn find_nested_column(&self, path: &Path) -> Option<ValueInfoRef> {
        if let Some(column) = self.columns.iter().find(|c| &c.path == path) {
            return Some(column.info.clone());
        }
        self.columns.iter().find_map(|c| {
            let rest = path.strip_prefix(&c.path).filter(|rest| !rest.is_empty())?;
            c.info.as_row()?.find_nested_column(&rest)
        })
    }
}

impl fmt::Display for RowValueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.columns.iter().map(|c| c.to_string());
        let all = match self.completeness {
            SchemaCompleteness::Closed => columns.collect_vec(),
            SchemaCompleteness::Open => columns.chain(["...".to_string()]).collect_vec(),
        };
        write!(f, "{{{}}}", all.join(", "))
    }
}
