use serde::Deserialize;
use sqlscope_common::path::{Path, PathElement};
use sqlscope_common::timestamp::Timestamp;
use sqlscope_common::value::ExpressionValue;
use sqlscope_common::value_info::{
    ColumnSparsity, KnownColumn, RowValueInfo, SchemaCompleteness, ValueInfo,
};

use crate::config::DatasetConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::provider::{DatasetProvider, DatasetRow};

#[derive(Debug, Deserialize)]
struct MemoryDatasetParams {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
    /// Milliseconds since the epoch, applied to every cell.
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug)]
pub struct MemoryDataset {
    name: String,
    info: RowValueInfo,
    rows: Vec<DatasetRow>,
}

impl MemoryDataset {
    pub fn new(name: impl Into<String>, info: RowValueInfo, rows: Vec<DatasetRow>) -> Self {
        Self {
            name: name.into(),
            info,
            rows,
        }
    }

    /// Builds a dataset from `{ "columns": [..], "rows": [[..], ..], "timestamp": ms }`.
    ///
    /// Rows are named by their position. Every column is declared with an unknown type and
    /// the shape is closed.
    pub fn from_config(config: &DatasetConfig) -> CatalogResult<Self> {
        let invalid = |reason: String| CatalogError::InvalidConfig {
            kind: config.kind.clone(),
            reason,
        };
        let params: MemoryDatasetParams =
            serde_json::from_value(config.params.clone()).map_err(|e| invalid(e.to_string()))?;
        let ts = match params.timestamp {
            Some(millis) => Timestamp::from_millis(millis)
                .ok_or_else(|| invalid(format!("timestamp out of range: {millis}")))?,
            None => Timestamp::NegativeInfinity,
        };
        let names: Vec<PathElement> = params
            .columns
            .iter()
            .map(|c| PathElement::from(c.as_str()))
            .collect();
        let columns = names
            .iter()
            .map(|n| {
                KnownColumn::new(Path::from(n.clone()), ValueInfo::any(), ColumnSparsity::Dense)
            })
            .collect();
        let rows = params
            .rows
            .iter()
            .enumerate()
            .map(|(i, values)| {
                if values.len() != names.len() {
                    return Err(invalid(format!(
                        "row {i} has {} values, expected {}",
                        values.len(),
                        names.len()
                    )));
                }
                let value = ExpressionValue::row(
                    names
                        .iter()
                        .cloned()
                        .zip(values.iter().map(|v| ExpressionValue::from_json(v, ts))),
                );
                Ok(DatasetRow::new(i.to_string(), value))
            })
            .collect::<CatalogResult<Vec<_>>>()?;
        let name = config.id.clone().unwrap_or_default();
        Ok(Self::new(
            name,
            RowValueInfo::new(columns, SchemaCompleteness::Closed),
            rows,
        ))
    }
}

impl DatasetProvider for MemoryDataset {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn row_info(&self) -> &RowValueInfo {
        &self.info
    }

    #[inline]
    fn rows(&self) -> CatalogResult<Vec<DatasetRow>> {
        Ok(self.rows.clone())
    }
}
