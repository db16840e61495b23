//! The `Model` kind: a model definition. Its channel declarations provide the fallback selectors
//! for Stack model instances that bind a channel without selectors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<Channel>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl ModelSpec {
    pub fn channels(&self) -> &[Channel] {
        self.channels.as_deref().unwrap_or_default()
    }

    /// The first channel declared with `alias`.
    pub fn channel_by_alias(&self, alias: &str) -> Option<&Channel> {
        self.channels()
            .iter()
            .find(|c| c.alias.as_deref() == Some(alias))
    }
}
