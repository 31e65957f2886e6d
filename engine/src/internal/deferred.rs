//! Deferred commands: `after <entity-id>` and implicit deferral for
//! ID-shaped actor selectors naming an entity that doesn't exist yet
//!.

use crate::internal::commands;
use crate::internal::state::{DeferredCommand, SimState};
use crate::public::program::Command;

/// A deferred command is ready once its waited-on entity exists; an
/// `assignGather` additionally needs an eligible actor actually available
/// right now, since existence of the target entity alone says nothing
/// about whether *an actor* to do the assigning is free yet.
fn is_ready(state: &SimState, d: &DeferredCommand) -> bool {
    if !state.entities.contains_key(&d.wait_for_entity) {
        return false;
    }
    if let Command::AssignGather(c) = &d.command {
        let actor_types = vec![c.actor_type.clone()];
        let ids = c.actors.actor_resource_node_ids.clone().unwrap_or_default();
        let selectors = c.actors.actor_resource_node_selectors.clone().unwrap_or_default();
        let filter = crate::internal::selector::resolve_actor_node_filter(state, &ids, &selectors);
        let Some(available_at) = crate::internal::eligibility::next_eligible_actor_availability_time(state, &actor_types, filter.as_ref()) else {
            return false;
        };
        return !crate::internal::clock::time_gt(available_at, state.now);
    }
    true
}

/// Run every deferred command that has become ready. Commands are released
/// in the order they were deferred.
pub fn process_deferred(state: &mut SimState) {
    let ready_indices: Vec<usize> = state
        .deferred_commands
        .iter()
        .enumerate()
        .filter(|(_, d)| is_ready(state, d))
        .map(|(i, _)| i)
        .collect();
    if ready_indices.is_empty() {
        return;
    }

    let ready_set: std::collections::HashSet<usize> = ready_indices.into_iter().collect();
    let mut ready = Vec::new();
    let mut still_waiting = Vec::new();
    for (i, d) in state.deferred_commands.drain(..).enumerate() {
        if ready_set.contains(&i) {
            ready.push(d);
        } else {
            still_waiting.push(d);
        }
    }
    state.deferred_commands = still_waiting;

    for d in ready {
        commands::execute_command(state, &d.command, d.source_command_index, None);
    }
}
