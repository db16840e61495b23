//! Metadata common to every document kind.

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Classification key/value pairs, used for matching.
pub type Labels = IndexMap<String, String>;

/// Mutable metadata carrying derived facts about a document or signal.
pub type Annotations = IndexMap<String, Value>;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "deserialize_labels"
    )]
    pub labels: Labels,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
}

impl ObjectMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns true when every `required` label is present with an equal value. Extra labels are
    /// permitted.
    pub fn has_labels(&self, required: &Labels) -> bool {
        is_subset(required, &self.labels)
    }

    /// Returns the annotation `key` if it holds a string.
    pub fn annotation_str(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).and_then(Value::as_str)
    }
}

/// Subset match of key/value pairs: every entry of `subset` must exist in `set` with an equal
/// value.
pub fn is_subset(subset: &Labels, set: &Labels) -> bool {
    subset
        .iter()
        .all(|(key, value)| set.get(key).is_some_and(|v| v == value))
}

/// The string form of a scalar label value. `null` is the empty string.
fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Deserialize a label map, accepting any scalar value in its string form.
pub fn deserialize_labels<'de, D>(deserializer: D) -> Result<Labels, D::Error>
where
    D: Deserializer<'de>,
{
    IndexMap::<String, Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| match scalar_string(value) {
            Some(value) => Ok((key, value)),
            None => Err(<D::Error as de::Error>::custom(format!(
                "label {key} is not a scalar value"
            ))),
        })
        .collect()
}

/// As [`deserialize_labels`], for an optional label map.
pub fn deserialize_optional_labels<'de, D>(deserializer: D) -> Result<Option<Labels>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_labels")] Labels);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(labels)| labels))
}
