use std::cell::Cell;

use smol_str::SmolStr;
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_common::value::ExpressionValue;
use sqlscope_common::value_info::{AtomType, ValueInfo};
use sqlscope_context::function::ColumnFunctionRef;
use sqlscope_context::options::BindOptions;

use super::{BindingScope, ReadThroughScope};
use crate::bound::{AllColumnsOutput, BoundExpr, BoundFunction, ColumnGetter, KeepFn};
use crate::error::BindResult;

/// Name of the function returning the timestamp of the tuple being tested.
pub const VALUE_TIMESTAMP: &str = "value_timestamp";

/// The scope of a `WHEN` clause, evaluated once per tuple with the tuple's timestamp in a
/// [`RowScope::When`] layer.
///
/// [`RowScope::When`]: sqlscope_context::row_scope::RowScope::When
#[derive(Debug)]
pub struct WhenScope<'a> {
    base: ReadThroughScope<'a>,
    is_tuple_dependent: Cell<bool>,
}

impl<'a> WhenScope<'a> {
    pub fn new(outer: &'a dyn BindingScope) -> BindResult<Self> {
        Ok(Self {
            base: ReadThroughScope::new(outer)?,
            is_tuple_dependent: Cell::new(false),
        })
    }

    /// Whether anything bound so far reads the tuple timestamp.
    #[inline]
    pub fn is_tuple_dependent(&self) -> bool {
        self.is_tuple_dependent.get()
    }

    #[inline]
    pub fn rebind_count(&self) -> usize {
        self.base.rebind_count()
    }
}

impl BindingScope for WhenScope<'_> {
    #[inline]
    fn depth(&self) -> usize {
        self.base.depth()
    }

    #[inline]
    fn options(&self) -> &BindOptions {
        self.base.options()
    }

    fn resolve_function(
        &self,
        table: &str,
        name: &str,
        args: &[BoundExpr],
        arg_scope: &dyn BindingScope,
    ) -> BindResult<Option<BoundFunction>> {
        if name == VALUE_TIMESTAMP {
            self.is_tuple_dependent.set(true);
            return Ok(Some(BoundFunction::new(
                |_, scope| {
                    let ts = scope.as_when().ts;
                    ExpressionValue::atom(ts, ts)
                },
                ValueInfo::atom(AtomType::Timestamp),
            )));
        }
        self.base.resolve_function(table, name, args, arg_scope)
    }

    #[inline]
    fn resolve_column_function(&self, name: &str) -> Option<ColumnFunctionRef> {
        self.base.resolve_column_function(name)
    }

    #[inline]
    fn resolve_column(&self, table: &str, path: &Path) -> BindResult<ColumnGetter> {
        self.base.resolve_column(table, path)
    }

    #[inline]
    fn resolve_all_columns(&self, table: &str, keep: KeepFn) -> BindResult<AllColumnsOutput> {
        self.base.resolve_all_columns(table, keep)
    }

    #[inline]
    fn resolve_bound_parameter(&self, name: &str) -> BindResult<ColumnGetter> {
        self.base.resolve_bound_parameter(name)
    }

    #[inline]
    fn resolve_dataset(&self, name: &str) -> BindResult<DatasetRef> {
        self.base.resolve_dataset(name)
    }

    #[inline]
    fn resolve_dataset_from_config(&self, config: &DatasetConfig) -> BindResult<DatasetRef> {
        self.base.resolve_dataset_from_config(config)
    }

    #[inline]
    fn resolve_table_name(&self, full: &Path) -> BindResult<(Path, SmolStr)> {
        self.base.resolve_table_name(full)
    }
}
