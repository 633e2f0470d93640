pub mod function;
pub mod options;
pub mod row_scope;
pub mod session;
