use smol_str::SmolStr;
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_common::timestamp::Timestamp;
use sqlscope_common::value::ExpressionValue;
use sqlscope_common::value_info::{AtomType, ValueInfo};
use sqlscope_context::function::ColumnFunctionRef;
use sqlscope_context::options::BindOptions;
use tracing::debug;

use super::{BindingScope, nested_depth};
use crate::bound::{AllColumnsOutput, BoundExpr, BoundFunction, ColumnGetter, KeepFn};
use crate::builtin;
use crate::error::{BindError, BindResult};

/// Name of the function returning the name of the column being evaluated.
pub const COLUMN_NAME: &str = "columnName";

/// The scope of a column expression, evaluated once per column with the column's name in a
/// [`RowScope::Column`] layer. Row data is out of reach here.
///
/// [`RowScope::Column`]: sqlscope_context::row_scope::RowScope::Column
#[derive(Debug)]
pub struct ColumnExprScope<'a> {
    outer: &'a dyn BindingScope,
    depth: usize,
}

impl<'a> ColumnExprScope<'a> {
    pub fn new(outer: &'a dyn BindingScope) -> BindResult<Self> {
        let depth = nested_depth(outer)?;
        debug!(depth, "entering column expression scope");
        Ok(Self { outer, depth })
    }
}

impl BindingScope for ColumnExprScope<'_> {
    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn options(&self) -> &BindOptions {
        self.outer.options()
    }

    fn resolve_function(
        &self,
        _table: &str,
        name: &str,
        args: &[BoundExpr],
        _arg_scope: &dyn BindingScope,
    ) -> BindResult<Option<BoundFunction>> {
        if name == COLUMN_NAME {
            return Ok(Some(BoundFunction::new(
                |_, scope| {
                    let column = scope.as_column().column_name;
                    ExpressionValue::atom(column.to_string(), Timestamp::NegativeInfinity)
                },
                ValueInfo::atom(AtomType::String),
            )));
        }
        // Column functions compute names, so their results are declared as strings.
        if let Some(function) = self.outer.resolve_column_function(name) {
            return Ok(Some(BoundFunction::new(
                move |args, scope| function.call(scope.as_column().column_name, args),
                ValueInfo::atom(AtomType::String),
            )));
        }
        match builtin::lookup(name, args)? {
            Some(function) => Ok(Some(function)),
            None => Err(BindError::UnknownFunction { name: name.into() }),
        }
    }

    #[inline]
    fn resolve_column_function(&self, name: &str) -> Option<ColumnFunctionRef> {
        self.outer.resolve_column_function(name)
    }

    fn resolve_column(&self, _table: &str, path: &Path) -> BindResult<ColumnGetter> {
        Err(BindError::ColumnInColumnExpr(path.clone()))
    }

    fn resolve_all_columns(&self, _table: &str, _keep: KeepFn) -> BindResult<AllColumnsOutput> {
        Err(BindError::WildcardInColumnExpr)
    }

    #[inline]
    fn resolve_dataset(&self, name: &str) -> BindResult<DatasetRef> {
        self.outer.resolve_dataset(name)
    }

    #[inline]
    fn resolve_dataset_from_config(&self, config: &DatasetConfig) -> BindResult<DatasetRef> {
        self.outer.resolve_dataset_from_config(config)
    }

    fn resolve_table_name(&self, full: &Path) -> BindResult<(Path, SmolStr)> {
        Err(BindError::TableNameInColumnExpr(full.clone()))
    }
}
