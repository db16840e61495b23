#![doc=include_str!( "../README.md")]
#![deny(unsafe_code)]
#![deny(clippy::all)]

use thiserror::Error;

pub mod channel;
mod document;
pub mod metadata;
pub mod model;
pub mod signal_group;
pub mod stack;

pub use document::{load_file, parse_documents, to_yaml_stream, Document, Kind, Spec};
pub use metadata::{Annotations, Labels, ObjectMetadata};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error parsing YAML: {0}")]
    YamlParse(String),

    #[error("Error encoding YAML: {0}")]
    YamlEncode(String),

    #[error("Document {position} has no kind")]
    MissingKind { position: usize },

    #[error("Document kind {0} has no registered serialization")]
    UnsupportedKind(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
