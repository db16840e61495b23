//! Compile a deterministic table of signal byte offsets, grouped by SimBus channel.
//!
//! The runtime reserves one slot of [`SLOT_SIZE`] bytes per signal. A group's slots start after
//! the slots of all groups inserted before it, and the scalar value of the signal at local index
//! `i` is addressed at `group.offset * SLOT_SIZE + i * VALUE_SIZE`.

use std::{io::Write, path::Path};

use indexmap::IndexMap;
use sim_kind::{
    signal_group::{Signal, SignalGroupSpec},
    Document, ObjectMetadata, Spec,
};

use crate::{index::DocumentIndex, selector, Error};

/// Bytes reserved per signal.
pub const SLOT_SIZE: usize = 24;
/// Stride of the scalar value within a group.
pub const VALUE_SIZE: usize = 8;

/// Label marking a document as a generated index artifact.
pub const INDEX_LABEL: &str = "index";
pub const DIRECT_INDEX_LABEL_VALUE: &str = "direct";
pub const DIRECT_INDEX_ANNOTATION: &str = "direct_index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedSignal {
    pub name: String,
    /// Index relative to the group.
    pub index: usize,
    /// Byte offset relative to the start of the index.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedGroup {
    name: String,
    signals: IndexMap<String, IndexedSignal>,
    /// Count of signals in all groups inserted before this one.
    pub offset: usize,
    /// Count of signals in this group.
    pub length: usize,
}

impl IndexedGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signals: IndexMap::new(),
            offset: 0,
            length: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signals(&self) -> impl Iterator<Item = &IndexedSignal> {
        self.signals.values()
    }

    pub fn signal(&self, name: &str) -> Option<&IndexedSignal> {
        self.signals.get(name)
    }

    /// Append a signal, unless a signal of that name already exists. Returns true if added.
    pub fn add_signal(&mut self, name: &str) -> bool {
        if self.signals.contains_key(name) {
            return false;
        }
        self.signals.insert(
            name.to_string(),
            IndexedSignal {
                name: name.to_string(),
                index: 0,
                offset: 0,
            },
        );
        true
    }

    fn to_document(&self) -> Document {
        let mut metadata = ObjectMetadata::new(&self.name);
        metadata.labels.insert(
            INDEX_LABEL.to_string(),
            DIRECT_INDEX_LABEL_VALUE.to_string(),
        );
        let mut direct_index = serde_yaml::Mapping::new();
        direct_index.insert("offset".into(), self.offset.into());
        direct_index.insert("length".into(), self.length.into());
        metadata.annotations.insert(
            DIRECT_INDEX_ANNOTATION.to_string(),
            serde_yaml::Value::Mapping(direct_index),
        );

        let signals = self
            .signals()
            .map(|s| {
                let mut signal = Signal::new(&s.name);
                signal
                    .annotations
                    .insert("index".to_string(), s.index.into());
                signal
                    .annotations
                    .insert("offset".to_string(), s.offset.into());
                signal
            })
            .collect();

        Document::new(
            metadata,
            Spec::SignalGroup(SignalGroupSpec {
                signals,
                ..Default::default()
            }),
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct DirectIndex {
    groups: IndexMap<String, IndexedGroup>,
}

impl DirectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `signal_groups`, each resolved to its channel via the Stack of
    /// `index`. SignalGroups not wired to any channel are skipped.
    pub fn compile<'a>(
        index: &DocumentIndex,
        signal_groups: impl IntoIterator<Item = &'a Document>,
    ) -> Result<Self, Error> {
        let mut direct_index = Self::new();
        for doc in signal_groups {
            let Some(spec) = doc.as_signal_group() else {
                continue;
            };
            let channel = match selector::resolve_channel(index, doc) {
                Ok(channel) => channel,
                Err(Error::NotFound(reason)) => {
                    log::warn!(
                        "SignalGroup not associated with SimBus channel: {} ({reason})",
                        doc.name()
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };
            let group = direct_index.get_or_create_group(&channel);
            for signal in &spec.signals {
                group.add_signal(&signal.signal);
            }
        }
        direct_index.calculate_offsets();
        Ok(direct_index)
    }

    /// The group named `name`, appended if not yet present.
    pub fn get_or_create_group(&mut self, name: &str) -> &mut IndexedGroup {
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| IndexedGroup::new(name))
    }

    pub fn add_signal(&mut self, group: &str, name: &str) {
        self.get_or_create_group(group).add_signal(name);
    }

    pub fn group(&self, name: &str) -> Option<&IndexedGroup> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &IndexedGroup> {
        self.groups.values()
    }

    /// Recompute all offsets from the current insertion order.
    pub fn calculate_offsets(&mut self) {
        let mut group_offset = 0;
        for group in self.groups.values_mut() {
            group.offset = group_offset;
            group.length = group.signals.len();
            let base = group_offset * SLOT_SIZE;
            for (i, signal) in group.signals.values_mut().enumerate() {
                signal.index = i;
                signal.offset = base + i * VALUE_SIZE;
            }
            group_offset += group.length;
        }
    }

    /// Byte offset of `signal` in `group`.
    pub fn lookup(&self, group: &str, signal: &str) -> Option<usize> {
        self.groups.get(group)?.signal(signal).map(|s| s.offset)
    }

    /// One SignalGroup document per group, labelled as a direct index artifact.
    pub fn to_documents(&self) -> Vec<Document> {
        self.groups().map(IndexedGroup::to_document).collect()
    }

    /// Append the index documents to the file at `path`.
    pub fn emit(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let write_error = |reason: String| Error::Write {
            path: path.to_path_buf(),
            reason,
        };

        let mut yaml = String::new();
        for doc in self.to_documents() {
            log::info!("Append direct index: {} (file={})", doc.name(), path.display());
            yaml.push_str("---\n");
            yaml.push_str(&doc.to_yaml().map_err(|e| write_error(e.to_string()))?);
        }

        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(yaml.as_bytes()))
            .map_err(|e| write_error(e.to_string()))
    }
}
