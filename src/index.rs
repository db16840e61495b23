//! An in-memory index over the YAML documents of a simulation directory.
//!
//! Documents are stored per [`Kind`] in file order and addressed by [`DocHandle`]s. The index
//! remembers which documents each file contributed, so that a modified file can be rewritten
//! with all of its documents, in their original order.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use sim_kind::{Document, Kind, Labels};
use walkdir::WalkDir;

use crate::Error;

const YAML_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Stable address of a document within a [`DocumentIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocHandle {
    pub kind: Kind,
    pub position: usize,
}

#[derive(Debug, Default)]
pub struct DocumentIndex {
    docs: IndexMap<Kind, Vec<Document>>,
    files: IndexMap<PathBuf, Vec<DocHandle>>,
    modified: IndexSet<PathBuf>,
    excluded: Vec<PathBuf>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the file at `path` in later scans.
    pub fn exclude(&mut self, path: impl Into<PathBuf>) {
        self.excluded.push(path.into());
    }

    /// Recursively index every YAML file below `root`, in file name order. Files which fail to
    /// parse are skipped. Returns the number of files indexed.
    pub fn scan(&mut self, root: impl AsRef<Path>) -> usize {
        let root = root.as_ref();
        let mut count = 0;
        let walker = WalkDir::new(root).sort_by_file_name().into_iter();
        for entry in walker.filter_map(|e| {
            e.map_err(|err| log::debug!("Scan error under {}: {err}", root.display()))
                .ok()
        }) {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_yaml(path) {
                continue;
            }
            if self.excluded.iter().any(|excluded| excluded == path) {
                log::debug!("Excluded from scan: {}", path.display());
                continue;
            }
            match sim_kind::load_file(path) {
                Ok(docs) => {
                    self.insert_file(path, docs);
                    count += 1;
                }
                Err(err) => log::warn!("Parse failed ({err}) on file: {}", path.display()),
            }
        }
        count
    }

    /// Incorporate the documents of a newly written file, without a full re-scan.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        if self.files.contains_key(path) {
            log::warn!("File already indexed: {}", path.display());
            return Ok(());
        }
        let docs = sim_kind::load_file(path)?;
        self.insert_file(path, docs);
        Ok(())
    }

    /// Insert `docs` as the contents of the file at `path`.
    pub fn insert_file(&mut self, path: impl Into<PathBuf>, docs: Vec<Document>) {
        let path = path.into();
        if self.files.contains_key(&path) {
            log::warn!("File already indexed: {}", path.display());
            return;
        }
        let mut handles = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let kind = doc.kind();
            log::info!("kind: {kind}; name={} ({})", doc.name(), path.display());
            doc.file = Some(path.clone());
            let list = self.docs.entry(kind.clone()).or_default();
            list.push(doc);
            handles.push(DocHandle {
                kind,
                position: list.len() - 1,
            });
        }
        self.files.insert(path, handles);
    }

    /// All documents of `kind`, in index order.
    pub fn documents(&self, kind: &Kind) -> &[Document] {
        self.docs.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Handles of all documents of `kind`, in index order.
    pub fn handles(&self, kind: &Kind) -> Vec<DocHandle> {
        (0..self.documents(kind).len())
            .map(|position| DocHandle {
                kind: kind.clone(),
                position,
            })
            .collect()
    }

    pub fn get(&self, handle: &DocHandle) -> Option<&Document> {
        self.docs.get(&handle.kind)?.get(handle.position)
    }

    pub fn get_mut(&mut self, handle: &DocHandle) -> Option<&mut Document> {
        self.docs.get_mut(&handle.kind)?.get_mut(handle.position)
    }

    /// The first document of `kind` named `name`.
    pub fn find_by_name(&self, kind: &Kind, name: &str) -> Option<&Document> {
        self.documents(kind).iter().find(|doc| doc.name() == name)
    }

    /// The first document of `kind` carrying all `labels` with equal values.
    pub fn find_by_label(&self, kind: &Kind, labels: &Labels) -> Option<&Document> {
        self.documents(kind)
            .iter()
            .find(|doc| doc.metadata.has_labels(labels))
    }

    /// Indexed files, in index order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Flag a previously indexed file for rewrite on the next [`DocumentIndex::save`].
    pub fn mark_modified(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if self.files.contains_key(path) {
            self.modified.insert(path.to_path_buf());
        } else {
            log::debug!("Not indexed, ignoring modification: {}", path.display());
        }
    }

    pub fn is_modified(&self, path: impl AsRef<Path>) -> bool {
        self.modified.contains(path.as_ref())
    }

    /// Rewrite every file flagged as modified. Files already written stay written if a later file
    /// fails.
    pub fn save(&mut self) -> Result<(), Error> {
        for file in &self.modified {
            self.write_file(file)?;
        }
        self.modified.clear();
        Ok(())
    }

    /// Rewrite every indexed file.
    pub fn save_all(&mut self) -> Result<(), Error> {
        for file in self.files.keys() {
            self.write_file(file)?;
        }
        self.modified.clear();
        Ok(())
    }

    fn write_file(&self, file: &Path) -> Result<(), Error> {
        let write_error = |reason: String| Error::Write {
            path: file.to_path_buf(),
            reason,
        };
        let docs = self
            .files
            .get(file)
            .into_iter()
            .flatten()
            .filter_map(|handle| self.get(handle));
        let yaml = sim_kind::to_yaml_stream(docs).map_err(|e| write_error(e.to_string()))?;
        std::fs::write(file, yaml).map_err(|e| write_error(e.to_string()))?;
        log::info!("Wrote file: {}", file.display());
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| YAML_EXTENSIONS.contains(&ext))
}
