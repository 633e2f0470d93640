//! Results of resolving free references: closures paired with their static descriptions.
//!
//! Closures never borrow the scope that produced them. Anything they need at evaluation time
//! is moved in or shared through an [`Arc`], so a bound expression stays valid after the bind
//! pass is over and can be evaluated from many threads at once.

use std::fmt::{self, Debug};
use std::sync::Arc;

use sqlscope_common::path::Path;
use sqlscope_common::value::{ExpressionValue, FlatRow, VariableFilter};
use sqlscope_common::value_info::ValueInfoRef;
use sqlscope_context::row_scope::RowScope;

pub type ExprExec = Arc<dyn Fn(&RowScope<'_>, VariableFilter) -> ExpressionValue + Send + Sync>;

pub type FunctionExec =
    Arc<dyn Fn(&[ExpressionValue], &RowScope<'_>) -> ExpressionValue + Send + Sync>;

pub type AllColumnsExec = Arc<dyn Fn(&RowScope<'_>, VariableFilter) -> FlatRow + Send + Sync>;

/// Decides whether a column survives a wildcard and under which name. `None` drops it.
pub type KeepFn = Arc<dyn Fn(&Path) -> Option<Path> + Send + Sync>;

/// An accessor for a column or a bound parameter.
#[derive(Clone)]
pub struct ColumnGetter {
    pub exec: ExprExec,
    pub info: ValueInfoRef,
}

impl ColumnGetter {
    pub fn new<F>(exec: F, info: ValueInfoRef) -> Self
    where
        F: Fn(&RowScope<'_>, VariableFilter) -> ExpressionValue + Send + Sync + 'static,
    {
        Self {
            exec: Arc::new(exec),
            info,
        }
    }

    #[inline]
    pub fn get(&self, scope: &RowScope<'_>, filter: VariableFilter) -> ExpressionValue {
        (self.exec)(scope, filter)
    }

    /// Wraps the accessor so that it reads from the enclosing row layer.
    pub fn pivot_outward(self) -> Self {
        let exec = self.exec;
        Self::new(move |scope, filter| exec(scope.outer(), filter), self.info)
    }
}

impl Debug for ColumnGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnGetter")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// A function resolved by name. Arguments arrive already evaluated.
#[derive(Clone)]
pub struct BoundFunction {
    pub exec: FunctionExec,
    pub result_info: ValueInfoRef,
}

impl BoundFunction {
    pub fn new<F>(exec: F, result_info: ValueInfoRef) -> Self
    where
        F: Fn(&[ExpressionValue], &RowScope<'_>) -> ExpressionValue + Send + Sync + 'static,
    {
        Self {
            exec: Arc::new(exec),
            result_info,
        }
    }

    #[inline]
    pub fn call(&self, args: &[ExpressionValue], scope: &RowScope<'_>) -> ExpressionValue {
        (self.exec)(args, scope)
    }
}

impl Debug for BoundFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFunction")
            .field("result_info", &self.result_info)
            .finish_non_exhaustive()
    }
}

/// The expansion of a wildcard.
#[derive(Clone)]
pub struct AllColumnsOutput {
    pub exec: AllColumnsExec,
    pub info: ValueInfoRef,
}

impl AllColumnsOutput {
    pub fn new<F>(exec: F, info: ValueInfoRef) -> Self
    where
        F: Fn(&RowScope<'_>, VariableFilter) -> FlatRow + Send + Sync + 'static,
    {
        Self {
            exec: Arc::new(exec),
            info,
        }
    }

    #[inline]
    pub fn get(&self, scope: &RowScope<'_>, filter: VariableFilter) -> FlatRow {
        (self.exec)(scope, filter)
    }

    pub fn pivot_outward(self) -> Self {
        let exec = self.exec;
        Self::new(move |scope, filter| exec(scope.outer(), filter), self.info)
    }
}

impl Debug for AllColumnsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllColumnsOutput")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExprMetadata {
    /// The value does not depend on the row scope.
    pub is_constant: bool,
}

#[derive(Clone)]
pub struct BoundExpr {
    pub exec: ExprExec,
    pub info: ValueInfoRef,
    pub metadata: ExprMetadata,
}

impl BoundExpr {
    pub fn new<F>(exec: F, info: ValueInfoRef, metadata: ExprMetadata) -> Self
    where
        F: Fn(&RowScope<'_>, VariableFilter) -> ExpressionValue + Send + Sync + 'static,
    {
        Self {
            exec: Arc::new(exec),
            info,
            metadata,
        }
    }

    pub fn constant(value: ExpressionValue, info: ValueInfoRef) -> Self {
        Self::new(
            move |_, _| value.clone(),
            info,
            ExprMetadata { is_constant: true },
        )
    }

    #[inline]
    pub fn evaluate(&self, scope: &RowScope<'_>) -> ExpressionValue {
        (self.exec)(scope, VariableFilter::default())
    }

    #[inline]
    pub fn evaluate_with(&self, scope: &RowScope<'_>, filter: VariableFilter) -> ExpressionValue {
        (self.exec)(scope, filter)
    }
}

impl From<ColumnGetter> for BoundExpr {
    fn from(getter: ColumnGetter) -> Self {
        Self {
            exec: getter.exec,
            info: getter.info,
            metadata: ExprMetadata::default(),
        }
    }
}

impl From<AllColumnsOutput> for BoundExpr {
    fn from(output: AllColumnsOutput) -> Self {
        let exec = output.exec;
        Self::new(
            move |scope, filter| ExpressionValue::from_flat_row(exec(scope, filter)),
            output.info,
            ExprMetadata::default(),
        )
    }
}

impl Debug for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundExpr")
            .field("info", &self.info)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
