//! The trigger engine: matching `clicked` /
//! `completed` / `depleted` / `exhausted` conditions and firing the
//! nested command once (or every time) they become true.

use crate::internal::clock::time_eq;
use crate::internal::commands;
use crate::internal::selector::resolve_node_set_sorted;
use crate::internal::state::{SimState, TriggerEventContext};
use crate::public::program::{TriggerCondition, TriggerMode};

fn selector_node_ids(state: &SimState, selector: &str) -> Vec<String> {
    resolve_node_set_sorted(state, &[], &[selector.to_string()])
}

/// `true` if every (or, for `Depleted`, any) selector-matched node's first
/// depletion lands exactly at `state.now`.
fn depletion_fires_now(state: &SimState, selector: &str, require_all: bool) -> bool {
    let ids = selector_node_ids(state, selector);
    if ids.is_empty() {
        return false;
    }
    if require_all && !ids.iter().all(|id| state.nodes.get(id).map(|n| n.depleted).unwrap_or(true)) {
        return false;
    }
    ids.iter().any(|id| {
        state
            .node_depletion_times
            .get(id)
            .and_then(|times| times.first())
            .map(|t| time_eq(*t, state.now))
            .unwrap_or(false)
    })
}

/// Build the event context a rule with `condition`/`mode` fires with right
/// now: the actors involved in whichever event(s) made the condition true
/// at this exact instant, plus any resource nodes a matching completion
/// created.
fn event_context_for(state: &SimState, condition: &TriggerCondition, mode: TriggerMode) -> TriggerEventContext {
    let mut actors = Vec::new();
    let mut created_node_ids = Vec::new();

    match condition {
        TriggerCondition::Clicked { action_id } => {
            for e in &state.click_events {
                if &e.action_id == action_id && time_eq(e.time, state.now) {
                    actors.extend(e.actors.iter().cloned());
                }
            }
        }
        TriggerCondition::Completed { action_id } => {
            for e in &state.completion_events {
                if &e.action_id == action_id && time_eq(e.time, state.now) {
                    actors.extend(e.actors.iter().cloned());
                    created_node_ids.extend(e.created_node_ids.iter().cloned());
                }
            }
        }
        TriggerCondition::Depleted { selector } | TriggerCondition::Exhausted { selector } => {
            let ids = selector_node_ids(state, selector);
            for e in &state.depletion_events {
                if ids.contains(&e.node_id) && time_eq(e.time, state.now) {
                    actors.extend(e.actors.iter().cloned());
                }
            }
        }
    }

    actors.sort_by(|a, b| crate::internal::natural_sort::cmp(a, b));
    actors.dedup();
    TriggerEventContext {
        actors,
        created_node_ids,
        mode,
    }
}

/// `true` if `condition` became true at exactly `state.now`.
pub fn condition_fires_now(state: &SimState, condition: &TriggerCondition) -> bool {
    match condition {
        TriggerCondition::Clicked { action_id } => state
            .action_click_times
            .get(action_id)
            .map(|times| times.iter().any(|t| time_eq(*t, state.now)))
            .unwrap_or(false),
        TriggerCondition::Completed { action_id } => state
            .action_completion_times
            .get(action_id)
            .map(|times| times.iter().any(|t| time_eq(*t, state.now)))
            .unwrap_or(false),
        TriggerCondition::Depleted { selector } => depletion_fires_now(state, selector, false),
        TriggerCondition::Exhausted { selector } => depletion_fires_now(state, selector, true),
    }
}

/// Fire every due trigger rule.
/// `once` rules are retired after firing; `every` rules stay armed.
pub fn process_triggers(state: &mut SimState) {
    let due: Vec<usize> = state
        .trigger_rules
        .iter()
        .enumerate()
        .filter(|(_, r)| (r.mode == TriggerMode::Every || !r.has_fired) && condition_fires_now(state, &r.condition))
        .map(|(i, _)| i)
        .collect();

    for idx in due {
        let command = state.trigger_rules[idx].inner_command.clone();
        let source = state.trigger_rules[idx].source_command_index;
        let condition = state.trigger_rules[idx].condition.clone();
        let mode = state.trigger_rules[idx].mode;
        state.trigger_rules[idx].has_fired = true;
        let ctx = event_context_for(state, &condition, mode);
        commands::execute_command(state, &command, source, Some(&ctx));
    }

    state.trigger_rules.retain(|r| r.mode == TriggerMode::Every || !r.has_fired);
}
