//! Annotations on the Stack consumed by the ModelC runtime of an exported FMU.

use std::path::Path;

use itertools::Itertools;

use crate::{index::DocumentIndex, selector, Error};

/// Comma separated model instance names, excluding the SimBus.
pub const MODEL_INST_ANNOTATION: &str = "model_runtime__model_inst";
/// Every YAML file of the simulation, relative to the simulation path.
pub const YAML_FILES_ANNOTATION: &str = "model_runtime__yaml_files";

/// Annotate the single Stack of `index` with its model instances and the simulation files, then
/// mark the Stack file modified.
pub fn annotate_stack(index: &mut DocumentIndex, sim_path: &Path) -> Result<(), Error> {
    let handle = selector::stack_handle(index)?;

    let yaml_files = index
        .files()
        .filter_map(|file| match file.strip_prefix(sim_path) {
            Ok(relative) => Some(relative.to_string_lossy().into_owned()),
            Err(_) => {
                log::warn!("File outside of simulation: {}", file.display());
                None
            }
        })
        .map(serde_yaml::Value::from)
        .collect::<Vec<_>>();

    let stack = index
        .get_mut(&handle)
        .ok_or_else(|| Error::Config("Stack not indexed".to_string()))?;
    let model_inst = stack
        .as_stack()
        .map(|spec| {
            spec.models()
                .iter()
                .filter(|model| model.name != selector::SIMBUS_MODEL)
                .map(|model| model.name.as_str())
                .join(",")
        })
        .unwrap_or_default();
    log::info!("Annotate Stack: {} (model_inst={model_inst})", stack.name());

    let annotations = &mut stack.metadata.annotations;
    annotations.insert(MODEL_INST_ANNOTATION.to_string(), model_inst.into());
    annotations.insert(
        YAML_FILES_ANNOTATION.to_string(),
        serde_yaml::Value::Sequence(yaml_files),
    );

    if let Some(file) = stack.file.clone() {
        index.mark_modified(file);
    }
    Ok(())
}
