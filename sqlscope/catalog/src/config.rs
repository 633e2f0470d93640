use serde::{Deserialize, Serialize};

/// Describes a dataset inline instead of naming a registered one.
///
/// # Examples
/// ```
/// use sqlscope_catalog::config::DatasetConfig;
///
/// let json = r#"{ "type": "alias", "params": { "dataset": "t" } }"#;
/// let config: DatasetConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.kind, "alias");
/// assert!(config.id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl DatasetConfig {
    pub fn new(kind: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            params,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
