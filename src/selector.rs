//! Resolve the SimBus channel a SignalGroup is wired to.
//!
//! Each model instance of the Stack binds channels by alias. A channel is associated with a
//! SignalGroup when every selector of the channel is present, with an equal value, in the labels
//! of the SignalGroup. Instance channels without selectors fall back to the selectors of the
//! same-aliased channel on the Model definition.

use sim_kind::{
    channel::Channel, metadata::is_subset, stack::ModelInstance, Document, Kind, Labels,
};

use crate::{
    index::{DocHandle, DocumentIndex},
    Error,
};

/// The SimBus pseudo-model instance, which carries no channel selectors of its own.
pub const SIMBUS_MODEL: &str = "simbus";

/// The handle of the single Stack document of the index.
pub fn stack_handle(index: &DocumentIndex) -> Result<DocHandle, Error> {
    match index.handles(&Kind::Stack).as_slice() {
        [handle] => Ok(handle.clone()),
        handles => Err(Error::Config(format!(
            "simulation contains {} Stacks, expected 1",
            handles.len()
        ))),
    }
}

/// The single Stack document of the index.
pub fn single_stack(index: &DocumentIndex) -> Result<&Document, Error> {
    match index.documents(&Kind::Stack) {
        [stack] => Ok(stack),
        stacks => Err(Error::Config(format!(
            "simulation contains {} Stacks, expected 1",
            stacks.len()
        ))),
    }
}

/// Find the name of the first Stack channel, scanning model instances and then their channels in
/// declared order, whose effective selectors match the labels of `signal_group`.
pub fn resolve_channel(index: &DocumentIndex, signal_group: &Document) -> Result<String, Error> {
    let stack = single_stack(index)?
        .as_stack()
        .ok_or_else(|| Error::Config("Stack document without a Stack spec".to_string()))?;

    let labels = &signal_group.metadata.labels;
    for instance in stack
        .models()
        .iter()
        .filter(|instance| instance.name != SIMBUS_MODEL)
    {
        for channel in instance.channels() {
            let Some(selectors) = effective_selectors(index, instance, channel) else {
                log::debug!(
                    "  {}: channel {:?} has no selectors",
                    instance.name,
                    channel.alias
                );
                continue;
            };
            if !is_subset(selectors, labels) {
                continue;
            }
            match &channel.name {
                Some(name) => {
                    log::info!(
                        "SimBus channel found: {name} (alias={:?}, signalgroup={})",
                        channel.alias,
                        signal_group.name()
                    );
                    return Ok(name.clone());
                }
                None => log::warn!(
                    "  {}: channel {:?} matches but has no name",
                    instance.name,
                    channel.alias
                ),
            }
        }
    }

    Err(Error::NotFound(format!(
        "no Stack channel with selectors matching SignalGroup {}",
        signal_group.name()
    )))
}

/// The first non-empty selector set of: the instance channel binding, the same-aliased channels
/// of the instance's Model definition.
fn effective_selectors<'a>(
    index: &'a DocumentIndex,
    instance: &ModelInstance,
    channel: &'a Channel,
) -> Option<&'a Labels> {
    channel.selectors().or_else(|| {
        let alias = channel.alias.as_deref()?;
        index
            .find_by_name(&Kind::Model, &instance.model.name)?
            .as_model()?
            .channels()
            .iter()
            .filter(|c| c.alias.as_deref() == Some(alias))
            .find_map(Channel::selectors)
    })
}
