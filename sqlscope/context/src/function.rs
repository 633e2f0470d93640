use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use smol_str::SmolStr;
use sqlscope_common::path::Path;
use sqlscope_common::value::ExpressionValue;

pub type ColumnFunctionImpl =
    Box<dyn Fn(&Path, &[ExpressionValue]) -> ExpressionValue + Send + Sync>;

pub type ColumnFunctionRef = Arc<ColumnFunction>;

/// A function evaluated once per column, receiving the column's name and its evaluated
/// arguments.
pub struct ColumnFunction {
    name: SmolStr,
    inner: ColumnFunctionImpl,
}

impl ColumnFunction {
    pub fn new<F>(name: impl Into<SmolStr>, inner: F) -> Self
    where
        F: Fn(&Path, &[ExpressionValue]) -> ExpressionValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn call(&self, column_name: &Path, args: &[ExpressionValue]) -> ExpressionValue {
        (self.inner)(column_name, args)
    }
}

impl Debug for ColumnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFunction")
            .field("name", &self.name)
            .finish()
    }
}

/// Column functions available to column expressions, by name.
#[derive(Debug, Clone, Default)]
pub struct ColumnFunctionRegistry {
    functions: HashMap<SmolStr, ColumnFunctionRef>,
}

impl ColumnFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, function: ColumnFunction) -> Option<ColumnFunctionRef> {
        self.functions
            .insert(function.name.clone(), Arc::new(function))
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<ColumnFunctionRef> {
        self.functions.get(name).cloned()
    }
}
