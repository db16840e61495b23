use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    model::ModelSpec, signal_group::SignalGroupSpec, stack::StackSpec, Error, ObjectMetadata,
};

/// The discriminator of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Stack,
    SignalGroup,
    Model,
    /// Any kind without a typed spec in this crate (e.g. `Runnable`).
    Other(String),
}

impl Kind {
    pub fn as_str(&self) -> &str {
        match self {
            Kind::Stack => "Stack",
            Kind::SignalGroup => "SignalGroup",
            Kind::Model => "Model",
            Kind::Other(kind) => kind,
        }
    }
}

impl From<&str> for Kind {
    fn from(kind: &str) -> Self {
        match kind {
            "Stack" => Kind::Stack,
            "SignalGroup" => Kind::SignalGroup,
            "Model" => Kind::Model,
            other => Kind::Other(other.to_string()),
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific document content.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Stack(StackSpec),
    SignalGroup(SignalGroupSpec),
    Model(ModelSpec),
    /// Opaque content of a kind without a typed spec. Such documents can be indexed and searched
    /// but not serialized.
    Other {
        kind: String,
        spec: serde_yaml::Value,
    },
}

/// A parsed document, remembering the file it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub metadata: ObjectMetadata,
    pub spec: Spec,
    pub file: Option<PathBuf>,
}

#[derive(Deserialize)]
struct RawDocument {
    kind: Option<String>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
    #[serde(default)]
    spec: serde_yaml::Value,
}

#[derive(Serialize)]
struct DocumentRef<'a, S> {
    kind: &'a str,
    metadata: &'a ObjectMetadata,
    spec: &'a S,
}

impl Document {
    pub fn new(metadata: ObjectMetadata, spec: Spec) -> Self {
        Self {
            metadata,
            spec,
            file: None,
        }
    }

    pub fn kind(&self) -> Kind {
        match &self.spec {
            Spec::Stack(_) => Kind::Stack,
            Spec::SignalGroup(_) => Kind::SignalGroup,
            Spec::Model(_) => Kind::Model,
            Spec::Other { kind, .. } => Kind::Other(kind.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn as_stack(&self) -> Option<&StackSpec> {
        match &self.spec {
            Spec::Stack(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelSpec> {
        match &self.spec {
            Spec::Model(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_signal_group(&self) -> Option<&SignalGroupSpec> {
        match &self.spec {
            Spec::SignalGroup(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_signal_group_mut(&mut self) -> Option<&mut SignalGroupSpec> {
        match &mut self.spec {
            Spec::SignalGroup(spec) => Some(spec),
            _ => None,
        }
    }

    /// Serialize this document as a single YAML document.
    pub fn to_yaml(&self) -> Result<String, Error> {
        match &self.spec {
            Spec::Stack(spec) => encode("Stack", &self.metadata, spec),
            Spec::SignalGroup(spec) => encode("SignalGroup", &self.metadata, spec),
            Spec::Model(spec) => encode("Model", &self.metadata, spec),
            Spec::Other { kind, .. } => Err(Error::UnsupportedKind(kind.clone())),
        }
    }

    fn from_raw(raw: RawDocument, position: usize) -> Result<Self, Error> {
        let kind = raw.kind.ok_or(Error::MissingKind { position })?;
        let spec = match Kind::from(kind.as_str()) {
            Kind::Stack => Spec::Stack(typed_spec(raw.spec)?),
            Kind::SignalGroup => Spec::SignalGroup(typed_spec(raw.spec)?),
            Kind::Model => Spec::Model(typed_spec(raw.spec)?),
            Kind::Other(kind) => Spec::Other {
                kind,
                spec: raw.spec,
            },
        };
        Ok(Self::new(raw.metadata.unwrap_or_default(), spec))
    }
}

fn encode<S: Serialize>(kind: &str, metadata: &ObjectMetadata, spec: &S) -> Result<String, Error> {
    serde_yaml::to_string(&DocumentRef {
        kind,
        metadata,
        spec,
    })
    .map_err(|e| Error::YamlEncode(e.to_string()))
}

fn typed_spec<T: DeserializeOwned + Default>(value: serde_yaml::Value) -> Result<T, Error> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(value).map_err(|e| Error::YamlParse(e.to_string()))
}

/// Parse every document of a (possibly multi-document) YAML string. Empty documents are ignored.
pub fn parse_documents(yaml: &str) -> Result<Vec<Document>, Error> {
    let mut docs = Vec::new();
    for de in serde_yaml::Deserializer::from_str(yaml) {
        let value =
            serde_yaml::Value::deserialize(de).map_err(|e| Error::YamlParse(e.to_string()))?;
        if value.is_null() {
            continue;
        }
        let raw: RawDocument =
            serde_yaml::from_value(value).map_err(|e| Error::YamlParse(e.to_string()))?;
        docs.push(Document::from_raw(raw, docs.len())?);
    }
    Ok(docs)
}

/// Load all documents from `path`, each remembering `path` as its source file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Document>, Error> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path)?;
    let mut docs = parse_documents(&yaml)?;
    for doc in &mut docs {
        doc.file = Some(path.to_path_buf());
    }
    Ok(docs)
}

/// Serialize documents as one multi-document YAML stream, separated by `---` lines.
pub fn to_yaml_stream<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Result<String, Error> {
    let mut out = String::new();
    for (i, doc) in docs.into_iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&doc.to_yaml()?);
    }
    Ok(out)
}
