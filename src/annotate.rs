//! Annotate SignalGroups with FMI variable information.
//!
//! One annotation run scans a simulation, optionally compiles and emits a [`DirectIndex`], applies
//! a [`Ruleset`] to the selected SignalGroups, allocates value references for every input and
//! output signal, annotates the Stack and finally rewrites the modified files.

use std::path::PathBuf;

use sim_kind::Kind;

use crate::{
    direct_index::{DirectIndex, INDEX_LABEL},
    index::{DocHandle, DocumentIndex},
    options::AnnotateOptions,
    ruleset::Ruleset,
    selector, stack, Error,
};

pub const FMI_VARIABLE_CAUSALITY: &str = "fmi_variable_causality";
pub const FMI_VARIABLE_VREF: &str = "fmi_variable_vref";
pub const FMI_VARIABLE_TYPE: &str = "fmi_variable_type";
pub const FMI_VARIABLE_NAME: &str = "fmi_variable_name";

/// SignalGroup annotation describing the encoding of its signals.
pub const VECTOR_TYPE: &str = "vector_type";
pub const VECTOR_TYPE_BINARY: &str = "binary";

/// File name of the emitted direct index, below `<sim>/data`.
pub const DIRECT_INDEX_FILE: &str = "direct_index.yaml";

const CAUSALITIES: [&str; 2] = ["input", "output"];
const VARIABLE_TYPE: &str = "Real";

/// Sequential value reference allocator. The first allocated reference is 1.
#[derive(Debug, Default, Clone)]
pub struct VrefCounter {
    last: usize,
}

impl VrefCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> usize {
        self.last += 1;
        self.last
    }
}

/// How value references are allocated to qualifying signals.
#[derive(Debug)]
pub enum ReferencePolicy {
    /// One counter, shared by every SignalGroup of a run.
    Counter(VrefCounter),
    /// The byte offset of the signal in the direct index of its channel.
    DirectIndex(DirectIndex),
}

/// Apply `ruleset` to the SignalGroup at `handle`, then allocate references to every signal with
/// an input or output causality. Returns the count of signals given a reference.
///
/// Binary SignalGroups are refused with [`Error::Unsupported`], without changes.
pub fn annotate_signal_group(
    index: &mut DocumentIndex,
    handle: &DocHandle,
    ruleset: &Ruleset,
    policy: &mut ReferencePolicy,
) -> Result<usize, Error> {
    let doc = index
        .get(handle)
        .ok_or_else(|| Error::NotFound(format!("no document at {handle:?}")))?;
    if doc.metadata.annotation_str(VECTOR_TYPE) == Some(VECTOR_TYPE_BINARY) {
        return Err(Error::Unsupported(format!(
            "binary SignalGroup {}",
            doc.name()
        )));
    }

    let channel = match policy {
        ReferencePolicy::DirectIndex(_) => match selector::resolve_channel(index, doc) {
            Ok(channel) => Some(channel),
            Err(Error::NotFound(reason)) => {
                log::warn!("No direct index references for {}: {reason}", doc.name());
                None
            }
            Err(err) => return Err(err),
        },
        ReferencePolicy::Counter(_) => None,
    };

    let doc = index
        .get_mut(handle)
        .ok_or_else(|| Error::NotFound(format!("no document at {handle:?}")))?;
    let file = doc.file.clone();
    let group_name = doc.name().to_string();
    let spec = doc
        .as_signal_group_mut()
        .ok_or_else(|| Error::Unsupported(format!("{group_name} is not a SignalGroup")))?;

    let mut count = 0;
    for signal in spec.signals.iter_mut() {
        ruleset.apply(signal);

        let qualifies = signal
            .annotation_str(FMI_VARIABLE_CAUSALITY)
            .is_some_and(|causality| CAUSALITIES.contains(&causality));
        if !qualifies {
            continue;
        }

        let vref = match policy {
            ReferencePolicy::Counter(counter) => Some(counter.next()),
            ReferencePolicy::DirectIndex(direct_index) => channel
                .as_deref()
                .and_then(|channel| direct_index.lookup(channel, &signal.signal)),
        };
        let Some(vref) = vref else {
            log::warn!(
                "Signal not in direct index: {} (signalgroup={group_name})",
                signal.signal
            );
            continue;
        };

        log::debug!("  {}: vref={vref}", signal.signal);
        let annotations = &mut signal.annotations;
        annotations.insert(FMI_VARIABLE_VREF.to_string(), vref.into());
        annotations.insert(FMI_VARIABLE_TYPE.to_string(), VARIABLE_TYPE.into());
        annotations.insert(FMI_VARIABLE_NAME.to_string(), signal.signal.as_str().into());
        count += 1;
    }

    if let Some(file) = file {
        index.mark_modified(file);
    }
    Ok(count)
}

/// The outcome of one annotation [`run`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// SignalGroups the ruleset was applied to, in index order.
    pub annotated: Vec<String>,
    /// SignalGroups refused by the annotation, e.g. binary SignalGroups.
    pub skipped: Vec<String>,
    /// The emitted direct index file.
    pub direct_index: Option<PathBuf>,
}

/// Handles of the SignalGroups selected for annotation: all SignalGroups, or those named by
/// `filter` when not empty. Index artifacts are never selected.
pub fn selected_signal_groups(index: &DocumentIndex, filter: &[String]) -> Vec<DocHandle> {
    index
        .handles(&Kind::SignalGroup)
        .into_iter()
        .filter(|handle| {
            let Some(doc) = index.get(handle) else {
                return false;
            };
            if doc.metadata.labels.contains_key(INDEX_LABEL) {
                return false;
            }
            if !filter.is_empty() && !filter.iter().any(|name| name == doc.name()) {
                log::info!("SignalGroup filtered: {}", doc.name());
                return false;
            }
            true
        })
        .collect()
}

/// Perform one annotation run over the simulation at `options.sim`.
///
/// A direct index left by an earlier run is not scanned, and is only replaced once the Stack
/// and the ruleset have been checked.
pub fn run(options: &AnnotateOptions) -> Result<RunSummary, Error> {
    let index_file = options.sim.join("data").join(DIRECT_INDEX_FILE);

    let mut index = DocumentIndex::new();
    if options.index {
        index.exclude(&index_file);
    }
    let count = index.scan(&options.sim);
    log::info!("Indexed {count} files: {}", options.sim.display());
    selector::stack_handle(&index)?;

    let ruleset = Ruleset::resolve(options.rule.as_deref(), options.ruleset.as_deref())?;
    let handles = selected_signal_groups(&index, &options.signal_groups);

    let mut summary = RunSummary::default();
    let mut policy = if options.index {
        let direct_index =
            DirectIndex::compile(&index, handles.iter().filter_map(|h| index.get(h)))?;

        if index_file.exists() {
            log::info!("Remove previous direct index: {}", index_file.display());
            std::fs::remove_file(&index_file)?;
        }
        log::info!("Generating Direct Index: {}", index_file.display());
        if let Some(parent) = index_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        direct_index.emit(&index_file)?;
        index.add(&index_file)?;
        summary.direct_index = Some(index_file);
        ReferencePolicy::DirectIndex(direct_index)
    } else {
        ReferencePolicy::Counter(VrefCounter::new())
    };

    match &ruleset {
        Some(ruleset) => {
            for handle in &handles {
                let name = index
                    .get(handle)
                    .map(|doc| doc.name().to_string())
                    .unwrap_or_default();
                log::info!("Annotate SignalGroup: {name}");
                match annotate_signal_group(&mut index, handle, ruleset, &mut policy) {
                    Ok(count) => {
                        log::info!("  {count} signals referenced");
                        summary.annotated.push(name);
                    }
                    Err(Error::Unsupported(reason)) => {
                        log::warn!("Skipped SignalGroup {name}: {reason}");
                        summary.skipped.push(name);
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        None => log::info!("No ruleset, SignalGroups are not annotated"),
    }

    stack::annotate_stack(&mut index, &options.sim)?;
    index.save()?;
    Ok(summary)
}
