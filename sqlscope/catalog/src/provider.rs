use std::fmt::Debug;
use std::sync::Arc;

use smol_str::SmolStr;
use sqlscope_common::value::ExpressionValue;
use sqlscope_common::value_info::RowValueInfo;

use crate::config::DatasetConfig;
use crate::error::CatalogResult;

pub type CatalogRef = Arc<dyn CatalogProvider>;
pub type DatasetRef = Arc<dyn DatasetProvider>;

/// Resolves dataset names and inline dataset configurations.
pub trait CatalogProvider: Debug + Send + Sync {
    /// Retrieves a registered dataset by its name.
    fn get_dataset(&self, name: &str) -> CatalogResult<Option<DatasetRef>>;

    /// Builds a dataset from an inline configuration.
    fn create_dataset(&self, config: &DatasetConfig) -> CatalogResult<DatasetRef>;
}

/// A named collection of rows with a declared row shape.
pub trait DatasetProvider: Debug + Send + Sync {
    /// Returns the name of the dataset.
    fn name(&self) -> &str;

    /// Returns the shape shared by all rows of the dataset.
    fn row_info(&self) -> &RowValueInfo;

    /// Returns every row of the dataset.
    fn rows(&self) -> CatalogResult<Vec<DatasetRow>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub name: SmolStr,
    pub value: ExpressionValue,
}

impl DatasetRow {
    #[inline]
    pub fn new(name: impl Into<SmolStr>, value: ExpressionValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
