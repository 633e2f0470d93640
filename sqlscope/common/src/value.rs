use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::path::{Path, PathElement};
use crate::timestamp::Timestamp;

/// An atomic value stored in a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(OrderedFloat<f64>),
    String(String),
    Timestamp(Timestamp),
}

macro_rules! for_each_non_null_variant {
    ($m:ident) => {
        $m!(boolean, bool, Boolean);
        $m!(int64, i64, Int64);
        $m!(uint64, u64, UInt64);
        $m!(float64, OrderedFloat<f64>, Float64);
        $m!(string, String, String);
        $m!(timestamp, Timestamp, Timestamp);
    };
}

macro_rules! impl_from_for_variant {
    ($_:ident, $ty:ty, $variant:ident) => {
        impl From<$ty> for CellValue {
            #[inline]
            fn from(value: $ty) -> Self {
                CellValue::$variant(value)
            }
        }
    };
}

for_each_non_null_variant!(impl_from_for_variant);

macro_rules! impl_as_for_variant {
    ($name:ident, $ty:ty, $variant:ident) => {
        impl CellValue {
            pastey::paste! {
                #[doc = concat!(" Attempts to downcast `self` to borrowed `", stringify!($ty), "`, returning `None` if not possible.")]
                #[inline]
                pub fn [<try_as_$name>](&self) -> Option<&$ty> {
                    match self {
                        CellValue::$variant(value) => Some(value),
                        _ => None
                    }
                }
            }
        }
    };
}

for_each_non_null_variant!(impl_as_for_variant);

impl From<f64> for CellValue {
    #[inline]
    fn from(value: f64) -> Self {
        CellValue::Float64(OrderedFloat(value))
    }
}

impl From<i32> for CellValue {
    #[inline]
    fn from(value: i32) -> Self {
        CellValue::Int64(value.into())
    }
}

impl From<&str> for CellValue {
    #[inline]
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl CellValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Converts a JSON scalar. Arrays and objects are not atoms and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;
        match value {
            Json::Null => Some(CellValue::Null),
            Json::Bool(b) => Some((*b).into()),
            Json::Number(n) => n
                .as_i64()
                .map(CellValue::from)
                .or_else(|| n.as_u64().map(CellValue::from))
                .or_else(|| n.as_f64().map(CellValue::from)),
            Json::String(s) => Some(s.as_str().into()),
            Json::Array(_) | Json::Object(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Boolean(v) => write!(f, "{v}"),
            CellValue::Int64(v) => write!(f, "{v}"),
            CellValue::UInt64(v) => write!(f, "{v}"),
            CellValue::Float64(v) => write!(f, "{v}"),
            CellValue::String(v) => write!(f, "{v:?}"),
            CellValue::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

/// Selects among several values found under the same column name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VariableFilter {
    /// The first value encountered.
    #[default]
    AnyOne,
    /// The value with the greatest timestamp.
    Latest,
    /// The value with the smallest timestamp.
    Earliest,
    /// Every value. Only meaningful on the last segment of a path; intermediate segments
    /// behave as [`VariableFilter::Latest`].
    All,
}

/// One `(path, value, timestamp)` triple produced by flattening a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub column: Path,
    pub value: CellValue,
    pub ts: Timestamp,
}

impl Cell {
    #[inline]
    pub fn new(column: impl Into<Path>, value: impl Into<CellValue>, ts: Timestamp) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            ts,
        }
    }
}

/// A flattened row, in structural encounter order.
pub type FlatRow = Vec<Cell>;

/// A structured runtime value: either a timestamped atom or an ordered list of named
/// sub-values. Names may repeat within a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionValue {
    Atom { value: CellValue, ts: Timestamp },
    Row(Vec<(PathElement, ExpressionValue)>),
}

impl Default for ExpressionValue {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl ExpressionValue {
    #[inline]
    pub fn atom(value: impl Into<CellValue>, ts: Timestamp) -> Self {
        Self::Atom {
            value: value.into(),
            ts,
        }
    }

    /// The absence marker: a null atom that is older than anything else.
    #[inline]
    pub fn empty() -> Self {
        Self::Atom {
            value: CellValue::Null,
            ts: Timestamp::NegativeInfinity,
        }
    }

    #[inline]
    pub fn row(entries: impl IntoIterator<Item = (PathElement, ExpressionValue)>) -> Self {
        Self::Row(entries.into_iter().collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Atom { value, .. } if value.is_null())
    }

    #[inline]
    pub fn as_atom(&self) -> Option<&CellValue> {
        match self {
            Self::Atom { value, .. } => Some(value),
            Self::Row(_) => None,
        }
    }

    /// The timestamp of an atom, or the latest timestamp found anywhere inside a row.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Atom { ts, .. } => *ts,
            Self::Row(entries) => entries
                .iter()
                .map(|(_, v)| v.timestamp())
                .max()
                .unwrap_or(Timestamp::NegativeInfinity),
        }
    }

    fn matching<'a>(
        &'a self,
        name: &'a PathElement,
    ) -> impl Iterator<Item = &'a ExpressionValue> + 'a {
        let entries: &[(PathElement, ExpressionValue)] = match self {
            Self::Row(entries) => entries,
            Self::Atom { .. } => &[],
        };
        entries
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn select<'a>(
        &'a self,
        name: &'a PathElement,
        filter: VariableFilter,
    ) -> Option<&'a ExpressionValue> {
        let mut candidates = self.matching(name);
        match filter {
            VariableFilter::AnyOne => candidates.next(),
            VariableFilter::Latest | VariableFilter::All => {
                candidates.max_by_key(|v| v.timestamp())
            }
            VariableFilter::Earliest => candidates.min_by_key(|v| v.timestamp()),
        }
    }

    /// Navigates into the value by `path`, returning [`ExpressionValue::empty`] when nothing
    /// is found.
    pub fn get_nested_column(&self, path: &Path, filter: VariableFilter) -> ExpressionValue {
        let Some(head) = path.head() else {
            return self.clone();
        };
        if path.len() == 1 {
            if filter == VariableFilter::All {
                let found: Vec<_> = self.matching(head).cloned().collect();
                return match found.len() {
                    0 => Self::empty(),
                    1 => found.into_iter().next().unwrap_or_default(),
                    _ => Self::row(found.into_iter().map(|v| (head.clone(), v))),
                };
            }
            return self.select(head, filter).cloned().unwrap_or_default();
        }
        match self.select(head, filter) {
            Some(child) => child.get_nested_column(&path.tail(), filter),
            None => Self::empty(),
        }
    }

    /// Walks every atom depth-first in stored order, calling `f` with the atom's full path.
    ///
    /// The walk stops as soon as `f` returns `false`, in which case `false` is returned.
    pub fn for_each_atom<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&Path, &CellValue, Timestamp) -> bool,
    {
        let mut prefix = Path::root();
        self.walk(&mut prefix, &mut f)
    }

    fn walk<F>(&self, prefix: &mut Path, f: &mut F) -> bool
    where
        F: FnMut(&Path, &CellValue, Timestamp) -> bool,
    {
        match self {
            Self::Atom { value, ts } => f(prefix, value, *ts),
            Self::Row(entries) => {
                for (name, child) in entries {
                    prefix.push(name.clone());
                    let keep_going = child.walk(prefix, f);
                    prefix.pop();
                    if !keep_going {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Flattens the value into `(path, value, timestamp)` triples.
    pub fn to_flat_row(&self) -> FlatRow {
        let mut cells = Vec::new();
        self.for_each_atom(|path, value, ts| {
            cells.push(Cell::new(path.clone(), value.clone(), ts));
            true
        });
        cells
    }

    /// Rebuilds a structured row from flattened cells. Cells sharing a path prefix are
    /// grouped under the first row entry with that name.
    pub fn from_flat_row(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut entries = Vec::new();
        for cell in cells {
            insert_cell(&mut entries, cell.column.segments(), cell.value, cell.ts);
        }
        Self::Row(entries)
    }

    /// Converts a JSON document. Objects become rows, arrays become rows keyed by index and
    /// scalars become atoms stamped with `ts`.
    pub fn from_json(value: &serde_json::Value, ts: Timestamp) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Object(map) => Self::row(
                map.iter()
                    .map(|(k, v)| (PathElement::from(k.as_str()), Self::from_json(v, ts))),
            ),
            Json::Array(items) => Self::row(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (PathElement::from(i.to_string()), Self::from_json(v, ts))),
            ),
            scalar => Self::atom(CellValue::from_json(scalar).unwrap_or(CellValue::Null), ts),
        }
    }
}

fn insert_cell(
    entries: &mut Vec<(PathElement, ExpressionValue)>,
    column: &[PathElement],
    value: CellValue,
    ts: Timestamp,
) {
    match column {
        [] => {}
        [name] => entries.push((name.clone(), ExpressionValue::atom(value, ts))),
        [name, rest @ ..] => {
            let existing = entries.iter_mut().find_map(|(n, v)| match v {
                ExpressionValue::Row(children) if n == name => Some(children),
                _ => None,
            });
            match existing {
                Some(children) => insert_cell(children, rest, value, ts),
                None => {
                    let mut children = Vec::new();
                    insert_cell(&mut children, rest, value, ts);
                    entries.push((name.clone(), ExpressionValue::Row(children)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(millis: i64) -> Timestamp {
        Timestamp::from_millis(millis).unwrap()
    }

    fn sample() -> ExpressionValue {
        ExpressionValue::row([
            ("x".into(), ExpressionValue::atom(1, ts(10))),
            (
                "y".into(),
                ExpressionValue::row([
                    ("a".into(), ExpressionValue::atom("first", ts(10))),
                    ("b".into(), ExpressionValue::atom(true, ts(20))),
                ]),
            ),
            ("x".into(), ExpressionValue::atom(2, ts(30))),
        ])
    }

    #[test]
    fn test_get_nested_column() {
        let value = sample();
        let any = value.get_nested_column(&Path::parse("x"), VariableFilter::AnyOne);
        assert_eq!(any, ExpressionValue::atom(1, ts(10)));
        let latest = value.get_nested_column(&Path::parse("x"), VariableFilter::Latest);
        assert_eq!(latest, ExpressionValue::atom(2, ts(30)));
        let earliest = value.get_nested_column(&Path::parse("x"), VariableFilter::Earliest);
        assert_eq!(earliest, ExpressionValue::atom(1, ts(10)));
        let all = value.get_nested_column(&Path::parse("x"), VariableFilter::All);
        assert_eq!(
            all,
            ExpressionValue::row([
                ("x".into(), ExpressionValue::atom(1, ts(10))),
                ("x".into(), ExpressionValue::atom(2, ts(30))),
            ])
        );

        let nested = value.get_nested_column(&Path::parse("y.b"), VariableFilter::AnyOne);
        assert_eq!(nested, ExpressionValue::atom(true, ts(20)));
        let missing = value.get_nested_column(&Path::parse("y.c"), VariableFilter::AnyOne);
        assert_eq!(missing, ExpressionValue::empty());
        let through_atom = value.get_nested_column(&Path::parse("x.z"), VariableFilter::AnyOne);
        assert!(through_atom.is_null());
    }

    #[test]
    fn test_for_each_atom_order() {
        let paths: Vec<String> = sample()
            .to_flat_row()
            .into_iter()
            .map(|c| c.column.to_string())
            .collect();
        assert_eq!(paths, ["x", "y.a", "y.b", "x"]);
    }

    #[test]
    fn test_for_each_atom_stops_early() {
        let mut seen = 0;
        let completed = sample().for_each_atom(|_, _, _| {
            seen += 1;
            seen < 2
        });
        assert!(!completed);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_flat_row_rebuild() {
        let cells = vec![
            Cell::new("a.b", 1, ts(1)),
            Cell::new("c", "d", ts(2)),
            Cell::new("a.e", 2.5, ts(3)),
        ];
        let value = ExpressionValue::from_flat_row(cells.clone());
        assert_eq!(
            value.to_flat_row(),
            vec![cells[0].clone(), cells[2].clone(), cells[1].clone()]
        );
        assert_eq!(value.timestamp(), ts(3));
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({ "name": "ada", "tags": ["x", "y"], "age": 36 });
        let value = ExpressionValue::from_json(&json, ts(5));
        assert_eq!(
            value.get_nested_column(&Path::parse("tags.1"), VariableFilter::AnyOne),
            ExpressionValue::atom("y", ts(5))
        );
        assert_eq!(
            value.get_nested_column(&Path::parse("age"), VariableFilter::AnyOne),
            ExpressionValue::atom(36i64, ts(5))
        );
    }
}
