use std::cell::Cell;

use smol_str::SmolStr;
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_context::function::ColumnFunctionRef;
use sqlscope_context::options::BindOptions;
use tracing::{debug, trace};

use super::{BindingScope, nested_depth};
use crate::bound::{AllColumnsOutput, BoundExpr, BoundFunction, ColumnGetter, KeepFn};
use crate::error::BindResult;

/// A scope that adds nothing of its own and reads everything through its outer scope.
///
/// Rows evaluated in this scope carry a [`RowScope::ReadThrough`] layer (or a layer that
/// extends it); every accessor obtained from the outer scope is wrapped so that it is handed
/// the enclosing layer instead.
///
/// [`RowScope::ReadThrough`]: sqlscope_context::row_scope::RowScope::ReadThrough
#[derive(Debug)]
pub struct ReadThroughScope<'a> {
    outer: &'a dyn BindingScope,
    depth: usize,
    rebinds: Cell<usize>,
}

impl<'a> ReadThroughScope<'a> {
    pub fn new(outer: &'a dyn BindingScope) -> BindResult<Self> {
        let depth = nested_depth(outer)?;
        debug!(depth, "entering read-through scope");
        Ok(Self {
            outer,
            depth,
            rebinds: Cell::new(0),
        })
    }

    #[inline]
    pub fn outer(&self) -> &'a dyn BindingScope {
        self.outer
    }

    /// How many function arguments have been rebound onto the outer row so far.
    #[inline]
    pub fn rebind_count(&self) -> usize {
        self.rebinds.get()
    }

    /// Makes `expr` evaluate against the enclosing row layer.
    fn rebind(&self, expr: &BoundExpr) -> BoundExpr {
        self.rebinds.set(self.rebinds.get() + 1);
        trace!(depth = self.depth, "rebinding function argument");
        let exec = expr.exec.clone();
        BoundExpr::new(
            move |scope, filter| exec(scope.outer(), filter),
            expr.info.clone(),
            expr.metadata,
        )
    }
}

impl BindingScope for ReadThroughScope<'_> {
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
        table: &str,
        name: &str,
        args: &[BoundExpr],
        arg_scope: &dyn BindingScope,
    ) -> BindResult<Option<BoundFunction>> {
        // Constants do not look at the row, so there is nothing to pivot.
        let outer_args: Vec<_> = args
            .iter()
            .map(|arg| {
                if arg.metadata.is_constant {
                    arg.clone()
                } else {
                    self.rebind(arg)
                }
            })
            .collect();
        let Some(outer_function) =
            self.outer
                .resolve_function(table, name, &outer_args, arg_scope)?
        else {
            return Ok(None);
        };
        let exec = outer_function.exec;
        Ok(Some(BoundFunction::new(
            move |args, scope| {
                if !scope.has_row() {
                    // Without a row the arguments cannot depend on it either; pass the empty
                    // scope along as is.
                    return exec(args, scope);
                }
                exec(args, scope.outer())
            },
            outer_function.result_info,
        )))
    }

    #[inline]
    fn resolve_column_function(&self, name: &str) -> Option<ColumnFunctionRef> {
        self.outer.resolve_column_function(name)
    }

    fn resolve_column(&self, table: &str, path: &Path) -> BindResult<ColumnGetter> {
        Ok(self.outer.resolve_column(table, path)?.pivot_outward())
    }

    fn resolve_all_columns(&self, table: &str, keep: KeepFn) -> BindResult<AllColumnsOutput> {
        Ok(self.outer.resolve_all_columns(table, keep)?.pivot_outward())
    }

    fn resolve_bound_parameter(&self, name: &str) -> BindResult<ColumnGetter> {
        Ok(self.outer.resolve_bound_parameter(name)?.pivot_outward())
    }

    #[inline]
    fn resolve_dataset(&self, name: &str) -> BindResult<DatasetRef> {
        self.outer.resolve_dataset(name)
    }

    #[inline]
    fn resolve_dataset_from_config(&self, config: &DatasetConfig) -> BindResult<DatasetRef> {
        self.outer.resolve_dataset_from_config(config)
    }

    #[inline]
    fn resolve_table_name(&self, full: &Path) -> BindResult<(Path, SmolStr)> {
        self.outer.resolve_table_name(full)
    }
}
