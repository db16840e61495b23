use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{metadata::deserialize_optional_labels, Labels};

/// A channel declaration on a Model definition, or a channel binding on a Stack model instance.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_labels"
    )]
    pub selectors: Option<Labels>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Channel {
    /// The selector set, if present and non-empty.
    pub fn selectors(&self) -> Option<&Labels> {
        self.selectors.as_ref().filter(|s| !s.is_empty())
    }
}
