use std::sync::Arc;

use sqlscope_catalog::provider::CatalogRef;

use crate::function::ColumnFunctionRegistry;
use crate::options::BindOptions;

/// Everything a root scope needs from the surrounding session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    catalog: CatalogRef,
    column_functions: Arc<ColumnFunctionRegistry>,
    pub options: BindOptions,
}

impl SessionContext {
    pub fn new(catalog: CatalogRef) -> Self {
        Self {
            catalog,
            column_functions: Arc::new(ColumnFunctionRegistry::new()),
            options: BindOptions::new(),
        }
    }

    #[must_use]
    pub fn with_column_functions(mut self, registry: ColumnFunctionRegistry) -> Self {
        self.column_functions = Arc::new(registry);
        self
    }

    #[inline]
    pub fn catalog(&self) -> &CatalogRef {
        &self.catalog
    }

    #[inline]
    pub fn column_functions(&self) -> &ColumnFunctionRegistry {
        &self.column_functions
    }
}
