//! Binding scopes.
//!
//! A scope resolves the free references of an expression. Scopes form a chain: every nested
//! scope holds a plain reference to its outer scope and may delegate to it, pivoting the
//! [`RowScope`] one layer outward on the way. Root scopes ([`TableScope`], [`ParamScope`])
//! end the chain.
//!
//! [`RowScope`]: sqlscope_context::row_scope::RowScope

mod column_expr;
mod extract;
mod params;
mod read_through;
mod table;
mod when;

use std::collections::HashMap;
use std::fmt::Debug;

use smol_str::SmolStr;
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_common::value::{Cell, ExpressionValue, FlatRow};
use sqlscope_context::function::ColumnFunctionRef;
use sqlscope_context::options::BindOptions;

pub use self::column_expr::{COLUMN_NAME, ColumnExprScope};
pub use self::extract::ExtractScope;
pub use self::params::ParamScope;
pub use self::read_through::ReadThroughScope;
pub use self::table::TableScope;
pub use self::when::{VALUE_TIMESTAMP, WhenScope};
use crate::bound::{AllColumnsOutput, BoundExpr, BoundFunction, ColumnGetter, KeepFn};
use crate::builtin;
use crate::error::{BindError, BindResult};

/// The capabilities every scope offers, so that any scope can serve as the outer scope of
/// another one.
///
/// Binding is single threaded: scopes may keep interior state that is updated while
/// resolving, and are therefore not `Sync`. What they return is.
pub trait BindingScope: Debug {
    /// Number of scopes between this one and the root. Root scopes are at depth 0.
    fn depth(&self) -> usize;

    fn options(&self) -> &BindOptions;

    /// Resolves a function by name.
    ///
    /// `Ok(None)` means the function does not exist here, which is not an error: the caller
    /// may still find it elsewhere. The default looks the name up among the built-in
    /// functions.
    fn resolve_function(
        &self,
        _table: &str,
        name: &str,
        args: &[BoundExpr],
        _arg_scope: &dyn BindingScope,
    ) -> BindResult<Option<BoundFunction>> {
        builtin::lookup(name, args)
    }

    /// Resolves a function evaluated once per column of a row.
    fn resolve_column_function(&self, _name: &str) -> Option<ColumnFunctionRef> {
        None
    }

    fn resolve_column(&self, _table: &str, path: &Path) -> BindResult<ColumnGetter> {
        Err(BindError::Unsupported(format!("reading column `{path}`")))
    }

    /// Expands a wildcard, keeping and renaming columns through `keep`.
    fn resolve_all_columns(&self, _table: &str, _keep: KeepFn) -> BindResult<AllColumnsOutput> {
        Err(BindError::Unsupported("wildcard".into()))
    }

    fn resolve_bound_parameter(&self, name: &str) -> BindResult<ColumnGetter> {
        Err(BindError::Unsupported(format!("bound parameter `${name}`")))
    }

    fn resolve_dataset(&self, name: &str) -> BindResult<DatasetRef> {
        Err(BindError::Unsupported(format!("dataset `{name}`")))
    }

    fn resolve_dataset_from_config(&self, config: &DatasetConfig) -> BindResult<DatasetRef> {
        Err(BindError::Unsupported(format!(
            "dataset of type `{}`",
            config.kind
        )))
    }

    /// Splits a possibly table-qualified name into the name within the table and the table
    /// name. An empty table name means the name is not qualified.
    fn resolve_table_name(&self, full: &Path) -> BindResult<(Path, SmolStr)> {
        Ok((full.clone(), SmolStr::default()))
    }
}

/// Computes the depth of a scope nested directly inside `outer`, refusing to go past the
/// configured limit.
pub(crate) fn nested_depth(outer: &dyn BindingScope) -> BindResult<usize> {
    let depth = outer.depth() + 1;
    let max = outer.options().get_max_depth();
    if depth > max {
        return Err(BindError::NestingTooDeep { depth, max });
    }
    Ok(depth)
}

/// Walks `input` and keeps every atom `keep` accepts, under the name it returns.
pub(crate) fn collect_kept(input: &ExpressionValue, keep: &KeepFn) -> FlatRow {
    let mut output = FlatRow::new();
    input.for_each_atom(|path, value, ts| {
        if let Some(column) = keep(path) {
            output.push(Cell {
                column,
                value: value.clone(),
                ts,
            });
        }
        true
    });
    output
}

/// Walks `input` and keeps only the atoms whose path is a key of a precomputed rename map.
pub(crate) fn collect_renamed(input: &ExpressionValue, renames: &HashMap<Path, Path>) -> FlatRow {
    let mut output = FlatRow::new();
    input.for_each_atom(|path, value, ts| {
        if let Some(column) = renames.get(path) {
            output.push(Cell {
                column: column.clone(),
                value: value.clone(),
                ts,
            });
        }
        true
    });
    output
}
