//! The `Stack` kind: the top-level document enumerating model instances and their channel
//! bindings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelInstance>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl StackSpec {
    pub fn models(&self) -> &[ModelInstance] {
        self.models.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInstance {
    pub name: String,

    pub model: ModelReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<Channel>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl ModelInstance {
    pub fn channels(&self) -> &[Channel] {
        self.channels.as_deref().unwrap_or_default()
    }
}

/// Reference from a model instance to its Model definition document.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReference {
    pub name: String,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}
