use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Annotations;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalGroupSpec {
    #[serde(default)]
    pub signals: Vec<Signal>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            signal: name.into(),
            ..Default::default()
        }
    }

    /// Returns the annotation `key` if it holds a string.
    pub fn annotation_str(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).and_then(serde_yaml::Value::as_str)
    }
}
