//! Name resolution for expressions.
//!
//! A [`Binder`](binder::Binder) walks an [`Expr`](expr::Expr) and asks a chain of
//! [`BindingScope`](scope::BindingScope)s to resolve every free reference. What comes out is
//! a [`BoundExpr`](bound::BoundExpr): a closure that is evaluated later against a
//! [`RowScope`](sqlscope_context::row_scope::RowScope) of matching shape.

pub mod binder;
pub mod bound;
mod builtin;
pub mod error;
pub mod expr;
pub mod scope;
