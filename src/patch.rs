//! Rename or remove the signals of a SignalGroup according to a patch table.
//!
//! The patch table is CSV with the header `source,target`. Each row maps a signal name to a new
//! name. An empty target keeps the name, and the target [`INACTIVE`] removes the signal.

use std::{collections::HashMap, io::Read, path::Path};

use sim_kind::signal_group::SignalGroupSpec;

use crate::Error;

pub const PATCH_HEADER: [&str; 2] = ["source", "target"];
/// Patch target which removes the signal.
pub const INACTIVE: &str = "inactive";

/// A loaded patch table, mapping source signal names to targets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignalPatch {
    targets: HashMap<String, String>,
}

impl SignalPatch {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Load(format!("{}: {e}", path.display())))?;
        Self::from_reader(file).map_err(|e| match e {
            Error::Load(reason) => Error::Load(format!("{}: {reason}", path.display())),
            e => e,
        })
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = reader.records();

        let header = records
            .next()
            .ok_or_else(|| Error::Load("empty patch table".to_string()))?
            .map_err(|e| Error::Load(e.to_string()))?;
        if header.iter().take(2).ne(PATCH_HEADER) {
            return Err(Error::Load(format!(
                "unexpected patch columns {:?}",
                header.iter().collect::<Vec<_>>()
            )));
        }

        let mut targets = HashMap::new();
        for record in records {
            let record = record.map_err(|e| Error::Load(e.to_string()))?;
            match (record.get(0), record.get(1)) {
                (Some(source), Some("")) => targets.insert(source.to_string(), source.to_string()),
                (Some(source), Some(target)) => {
                    targets.insert(source.to_string(), target.to_string())
                }
                _ => {
                    return Err(Error::Load(format!(
                        "patch row without target: {:?}",
                        record.iter().collect::<Vec<_>>()
                    )))
                }
            };
        }
        Ok(Self { targets })
    }

    /// Apply the patch to `spec`. Signals not listed in the patch are kept unless
    /// `remove_unknown`.
    pub fn apply(&self, spec: &mut SignalGroupSpec, remove_unknown: bool) {
        spec.signals
            .retain_mut(|signal| match self.targets.get(&signal.signal) {
                Some(target) if target == INACTIVE => {
                    log::info!("Patch Signals: remove: {}", signal.signal);
                    false
                }
                Some(target) => {
                    log::info!("Patch Signals: patch: {} -> {target}", signal.signal);
                    signal.signal = target.clone();
                    true
                }
                None if remove_unknown => {
                    log::info!("Patch Signals: remove: {}", signal.signal);
                    false
                }
                None => true,
            });
    }
}

/// Patch every SignalGroup of the file at `path`, then rewrite the file.
pub fn patch_signal_group(
    path: impl AsRef<Path>,
    patch_csv: impl AsRef<Path>,
    remove_unknown: bool,
) -> Result<(), Error> {
    let path = path.as_ref();
    let patch = SignalPatch::from_csv_path(patch_csv)?;

    let mut docs = sim_kind::load_file(path)?;
    let mut patched = 0;
    for spec in docs.iter_mut().filter_map(|doc| doc.as_signal_group_mut()) {
        patch.apply(spec, remove_unknown);
        patched += 1;
    }
    if patched == 0 {
        return Err(Error::NotFound(format!(
            "no SignalGroup in {}",
            path.display()
        )));
    }

    let write_error = |reason: String| Error::Write {
        path: path.to_path_buf(),
        reason,
    };
    let yaml = sim_kind::to_yaml_stream(&docs).map_err(|e| write_error(e.to_string()))?;
    std::fs::write(path, yaml).map_err(|e| write_error(e.to_string()))
}
