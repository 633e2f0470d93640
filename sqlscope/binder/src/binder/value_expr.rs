use std::sync::Arc;

use itertools::Itertools;
use smol_str::SmolStr;
use sqlscope_common::path::Path;
use sqlscope_common::timestamp::Timestamp;
use sqlscope_common::value::{CellValue, ExpressionValue};
use sqlscope_common::value_info::{AtomType, ValueInfo, ValueInfoRef};
use tracing::trace;

use super::Binder;
use crate::bound::{BoundExpr, ExprMetadata, KeepFn};
use crate::error::{BindError, BindResult};
use crate::expr::Expr;

impl Binder<'_> {
    pub fn bind_value_expression(&self, expr: &Expr) -> BindResult<BoundExpr> {
        match expr {
            Expr::Constant(value) => Ok(bind_constant(value)),
            Expr::Column { table, path } => Ok(self.scope.resolve_column(table, path)?.into()),
            Expr::Wildcard {
                table,
                prefix,
                rename,
            } => self.bind_wildcard(table, prefix, rename.as_ref()),
            Expr::Parameter(name) => Ok(self.scope.resolve_bound_parameter(name)?.into()),
            Expr::Function { table, name, args } => self.bind_function(table, name, args),
        }
    }

    fn bind_wildcard(
        &self,
        table: &SmolStr,
        prefix: &Path,
        rename: Option<&Path>,
    ) -> BindResult<BoundExpr> {
        let (prefix, table) = if table.is_empty() && !prefix.is_empty() {
            self.scope.resolve_table_name(prefix)?
        } else {
            (prefix.clone(), table.clone())
        };
        let rename = rename.cloned().unwrap_or_else(|| prefix.clone());
        trace!(%table, %prefix, %rename, "binding wildcard");
        let keep: KeepFn = Arc::new(move |path: &Path| {
            let column = rename.concat(&path.strip_prefix(&prefix)?);
            (!column.is_empty()).then_some(column)
        });
        Ok(self.scope.resolve_all_columns(&table, keep)?.into())
    }

    fn bind_function(&self, table: &str, name: &str, args: &[Expr]) -> BindResult<BoundExpr> {
        let args: Vec<_> = args
            .iter()
            .map(|arg| self.bind_value_expression(arg))
            .try_collect()?;
        let function = self
            .scope
            .resolve_function(table, name, &args, self.scope)?
            .ok_or_else(|| BindError::UnknownFunction { name: name.into() })?;
        let exec = function.exec;
        Ok(BoundExpr::new(
            move |scope, filter| {
                let values: Vec<_> = args
                    .iter()
                    .map(|arg| arg.evaluate_with(scope, filter))
                    .collect();
                exec(&values, scope)
            },
            function.result_info,
            ExprMetadata::default(),
        ))
    }
}

pub fn bind_constant(value: &CellValue) -> BoundExpr {
    let info: ValueInfoRef = match atom_type(value) {
        Some(ty) => ValueInfo::atom(ty),
        None => ValueInfo::any(),
    };
    BoundExpr::constant(
        ExpressionValue::atom(value.clone(), Timestamp::NegativeInfinity),
        info,
    )
}

fn atom_type(value: &CellValue) -> Option<AtomType> {
    match value {
        CellValue::Null => None,
        CellValue::Boolean(_) => Some(AtomType::Boolean),
        CellValue::Int64(_) | CellValue::UInt64(_) => Some(AtomType::Integer),
        CellValue::Float64(_) => Some(AtomType::Float),
        CellValue::String(_) => Some(AtomType::String),
        CellValue::Timestamp(_) => Some(AtomType::Timestamp),
    }
}
