pub mod dataset;

use std::collections::HashMap;
use std::sync::Arc;

use sqlscope_common::error::not_implemented;
use tracing::debug;

use self::dataset::MemoryDataset;
use crate::config::DatasetConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::provider::{CatalogProvider, DatasetRef};

/// A catalog holding a fixed set of datasets in memory.
///
/// Inline configurations of type `memory` build a fresh [`MemoryDataset`]; type `alias`
/// points at a registered dataset through `params.dataset`.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    datasets: HashMap<String, DatasetRef>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dataset(&mut self, dataset: DatasetRef) -> Option<DatasetRef> {
        self.datasets.insert(dataset.name().to_string(), dataset)
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: DatasetRef) -> Self {
        self.add_dataset(dataset);
        self
    }
}

impl CatalogProvider for MemoryCatalog {
    #[inline]
    fn get_dataset(&self, name: &str) -> CatalogResult<Option<DatasetRef>> {
        Ok(self.datasets.get(name).cloned())
    }

    fn create_dataset(&self, config: &DatasetConfig) -> CatalogResult<DatasetRef> {
        debug!(kind = %config.kind, id = ?config.id, "creating dataset from config");
        match config.kind.as_str() {
            "memory" => Ok(Arc::new(MemoryDataset::from_config(config)?)),
            "alias" => {
                let target = config
                    .params
                    .get("dataset")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| CatalogError::InvalidConfig {
                        kind: config.kind.clone(),
                        reason: "missing string parameter `dataset`".into(),
                    })?;
                self.get_dataset(target)?
                    .ok_or_else(|| CatalogError::DatasetNotFound(target.to_string()))
            }
            other => not_implemented(format!("dataset type `{other}`"), None),
        }
    }
}
