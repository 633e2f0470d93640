mod value_expr;

use crate::bound::BoundExpr;
use crate::error::BindResult;
use crate::expr::Expr;
use crate::scope::BindingScope;

/// Binds expressions against a scope.
#[derive(Debug)]
pub struct Binder<'a> {
    scope: &'a dyn BindingScope,
}

impl<'a> Binder<'a> {
    pub fn new(scope: &'a dyn BindingScope) -> Self {
        Binder { scope }
    }

    pub fn bind(&self, expr: &Expr) -> BindResult<BoundExpr> {
        self.bind_value_expression(expr)
    }
}
