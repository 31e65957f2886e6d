//! Action scheduling, gather assignment, and the queue/auto-queue state
//! machines.

use crate::internal::clock::{quantize_duration, time_lt};
use crate::internal::economy::compute_snapshot;
use crate::internal::eligibility::{self, ActorResolution};
use crate::internal::event_queue::boundary_phase;
use crate::internal::modifiers::{apply_modifiers, key_action_cost, key_action_duration};
use crate::internal::selector::{resolve_actor_node_filter, resolve_node_set_sorted, resolve_node_set_sorted_for_event};
use crate::internal::state::{PendingCompletion, SimState, SpawnGatherRule};
use crate::public::catalogue::{ActionDef, ManyWorkersKind};
use crate::public::human_delay::{human_delay_sample, HumanDelayRng};
use crate::public::result::{ActivityKind, CommandResultOutcome, ViolationCode};
use std::collections::HashMap;

#[derive(Debug)]
pub enum ScheduleOutcome {
    Scheduled {
        completion_time: f64,
        actors: Vec<String>,
        started_at: f64,
    },
    Blocked {
        code: ViolationCode,
        message: String,
    },
}

fn population_cost(state: &SimState, action: &ActionDef) -> Option<(String, f64)> {
    let pop = state.population.as_ref()?;
    let consumed: f64 = action
        .creates
        .iter()
        .map(|(entity_type, count)| pop.consumed_by_entity_type.get(entity_type).copied().unwrap_or(0.0) * (*count as f64))
        .sum();
    if consumed == 0.0 {
        return None;
    }
    Some((pop.resource.clone(), consumed))
}

fn effective_cost(state: &SimState, action: &ActionDef) -> HashMap<String, f64> {
    let mut cost = HashMap::new();
    for (resource, amount) in &action.cost {
        let key = key_action_cost(&action.id, resource);
        let effective = apply_modifiers(*amount, &[key], &state.modifiers);
        *cost.entry(resource.clone()).or_insert(0.0) += effective;
    }
    if let Some((resource, amount)) = population_cost(state, action) {
        *cost.entry(resource).or_insert(0.0) += amount;
    }
    cost
}

/// Duration after modifiers, many-workers scaling, and task-efficiency
/// scaling. A `taskType` present on the action multiplies
/// the duration by its configured efficiency factor; see DESIGN.md "task
/// efficiency".
fn effective_duration(state: &SimState, action: &ActionDef, worker_count: usize) -> f64 {
    let base = apply_modifiers(action.base_duration, &[key_action_duration(&action.id)], &state.modifiers);

    let many_workers_divisor = match &action.many_workers {
        Some(ManyWorkersKind::Aoe2(cfg)) if worker_count > 1 => 1.0 + (worker_count as f64 - 1.0) * cfg.additional_worker_rate,
        _ => 1.0,
    };

    let efficiency = state.task_efficiency.factor_for(action.task_type.as_deref());
    let efficiency_multiplier = if action.task_type.is_some() { efficiency } else { 1.0 };

    quantize_duration(base / many_workers_divisor * efficiency_multiplier)
}

/// Sum of `resource`'s cost across every queue rule other than
/// `exclude_source_command_index` whose last attempt failed on
/// `INSUFFICIENT_RESOURCES`. Folded into the floor a scheduling attempt must
/// clear, so a rule already waiting on a resource can't have it drained out
/// from under it by a second rule that hasn't hit that wall yet.
fn reserved_cost_for_resource(state: &SimState, resource: &str, exclude_source_command_index: usize) -> f64 {
    state
        .queue_rules
        .iter()
        .filter(|r| r.source_command_index != exclude_source_command_index)
        .filter(|r| r.last_blocked_reason == Some(ViolationCode::InsufficientResources))
        .filter_map(|r| state.actions.get(&r.action_id))
        .map(|action| effective_cost(state, action).get(resource).copied().unwrap_or(0.0))
        .sum()
}

/// The atomic "try to schedule `action_id` right now" transaction: validate,
/// resolve eligible actors, consume resource nodes, resolve effective cost,
/// check floors, charge, compute duration, then mark actors busy and
/// enqueue the completion.
#[allow(clippy::too_many_arguments)]
pub fn try_schedule_action_now(
    state: &mut SimState,
    source_command_index: usize,
    action_id: &str,
    actor_selectors: Option<&[String]>,
    actor_node_ids: &[String],
    actor_node_selectors: &[String],
) -> ScheduleOutcome {
    let Some(action) = state.actions.get(action_id).cloned() else {
        return ScheduleOutcome::Blocked {
            code: ViolationCode::ActionNotFound,
            message: format!("unknown action id: {action_id}"),
        };
    };

    let filter = resolve_actor_node_filter(state, actor_node_ids, actor_node_selectors);
    let actor_count = action.actor_count.unwrap_or(1);
    let resolution = eligibility::resolve_actors(state, &action.actor_types, actor_count, true, actor_selectors, filter.as_ref());
    let actors = match resolution {
        ActorResolution::Ok(actors) => actors,
        other => {
            let code = other.violation_code().unwrap();
            return ScheduleOutcome::Blocked {
                code,
                message: format!("no eligible actor for {action_id}"),
            };
        }
    };

    let mut consumed_node_ids = Vec::new();
    for spec in &action.consumes_resource_nodes {
        let available: Vec<String> = resolve_node_set_sorted(state, &[], &[format!("proto:{}", spec.prototype_id)])
            .into_iter()
            .filter(|id| !state.nodes[id].depleted)
            .take(spec.count as usize)
            .collect();
        if available.len() < spec.count as usize {
            return ScheduleOutcome::Blocked {
                code: ViolationCode::NoResource,
                message: format!("not enough {} resource nodes available for {action_id}", spec.prototype_id),
            };
        }
        consumed_node_ids.extend(available);
    }

    let cost = effective_cost(state, &action);
    for (resource, amount) in &cost {
        let projected = state.resources.get(resource).copied().unwrap_or(0.0) - amount;
        let floor = state.resource_floor(resource) + reserved_cost_for_resource(state, resource, source_command_index);
        if projected < floor - crate::internal::clock::EPS {
            let is_population = state.population.as_ref().map(|p| &p.resource) == Some(resource);
            let (code, message) = if is_population {
                (
                    ViolationCode::Housed,
                    format!("population capacity exceeded for {action_id} (need {amount:.2}, floor {floor:.2})"),
                )
            } else {
                (
                    ViolationCode::InsufficientResources,
                    format!("insufficient {resource} for {action_id} (need {amount:.2}, floor {floor:.2})"),
                )
            };
            return ScheduleOutcome::Blocked {
                code,
                message,
            };
        }
    }

    for (resource, amount) in &cost {
        state.charge_resource(resource, *amount);
    }
    for node_id in &consumed_node_ids {
        state.nodes.remove(node_id);
    }

    let duration = effective_duration(state, &action, actors.len());
    let started_at = state.now;
    let completion_time = started_at + duration;

    for actor_id in &actors {
        if let Some(entity) = state.entities.get_mut(actor_id) {
            entity.busy_until = completion_time;
            entity.resource_node_id = None;
        }
        state.switch_entity_activity(actor_id, ActivityKind::Action, action_id, true);
    }
    state.action_click_times.entry(action_id.to_string()).or_default().push(started_at);
    state.click_events.push(crate::internal::state::ClickEvent {
        action_id: action_id.to_string(),
        time: started_at,
        actors: actors.clone(),
    });

    state.completions.push(
        completion_time,
        boundary_phase::COMPLETION,
        PendingCompletion {
            source_command_index,
            action_id: action_id.to_string(),
            actors: actors.clone(),
            started_at,
        },
    );

    ScheduleOutcome::Scheduled {
        completion_time,
        actors,
        started_at,
    }
}

/// Apply a completed action's effects: spawn created entities/nodes, apply
/// resource deltas and completion modifiers, return actors to idle, and
/// record the completion time.
pub fn apply_completion(state: &mut SimState, completion: &PendingCompletion) {
    let Some(action) = state.actions.get(&completion.action_id).cloned() else {
        return;
    };

    for (entity_type, count) in &action.creates {
        for _ in 0..*count {
            state.create_entity(entity_type);
        }
    }
    let mut created_node_ids = Vec::new();
    for spec in &action.creates_resource_nodes {
        for _ in 0..spec.count {
            if let Ok(id) = state.create_node(&spec.prototype_id) {
                created_node_ids.push(id);
            }
        }
    }
    for (resource, delta) in &action.resource_delta_on_complete {
        if *delta >= 0.0 {
            state.grant_resource(resource, *delta);
        } else {
            state.charge_resource(resource, -delta);
        }
    }
    state.modifiers.extend(action.modifiers_on_complete.clone());

    for actor_id in &completion.actors {
        state.switch_entity_activity(actor_id, ActivityKind::Idle, "", false);
    }

    state
        .action_completion_times
        .entry(completion.action_id.clone())
        .or_default()
        .push(state.now);
    state.completion_events.push(crate::internal::state::CompletionEvent {
        action_id: completion.action_id.clone(),
        time: state.now,
        actors: completion.actors.clone(),
        created_node_ids,
    });
}

/// Assign up to `count` (or every, if `all`) eligible idle-or-reassignable
/// entities of `actor_type` onto the resolved node set.
#[allow(clippy::too_many_arguments)]
pub fn assign_gather(
    state: &mut SimState,
    actor_type: &str,
    all: bool,
    count: Option<usize>,
    actor_selectors: Option<&[String]>,
    actor_node_ids: &[String],
    actor_node_selectors: &[String],
    node_ids: &[String],
    node_selectors: &[String],
    allow_empty_selector_match: bool,
) -> Result<Vec<String>, (ViolationCode, String)> {
    let targets = resolve_node_set_sorted(state, node_ids, node_selectors);
    if targets.is_empty() && !allow_empty_selector_match {
        return Err((ViolationCode::NoResource, "assignGather matched no resource nodes".into()));
    }

    let filter = resolve_actor_node_filter(state, actor_node_ids, actor_node_selectors);
    let actor_types = vec![actor_type.to_string()];
    let pool: Vec<String> = if let Some(selectors) = actor_selectors {
        match eligibility::resolve_actors(state, &actor_types, selectors.len(), false, Some(selectors), filter.as_ref()) {
            ActorResolution::Ok(ids) => ids,
            other => return Err((other.violation_code().unwrap(), "assignGather found no eligible actor".into())),
        }
    } else {
        let eligible: Vec<String> = state
            .entities
            .keys()
            .filter(|id| eligibility::is_eligible(state, id, &actor_types, false, filter.as_ref()))
            .cloned()
            .collect();
        if eligible.is_empty() {
            return Err((ViolationCode::NoActors, format!("no {actor_type} available to assign")));
        }
        let ranked = eligibility::rank_entities(state, &eligible, filter.as_ref());
        let n = if all { ranked.len() } else { count.unwrap_or(1).min(ranked.len()) };
        ranked.into_iter().take(n).collect()
    };

    let mut assigned = Vec::new();
    let mut node_cursor: HashMap<String, usize> = HashMap::new();
    for actor_id in &pool {
        let Some(node_id) = next_available_node(state, &targets, &mut node_cursor) else {
            break;
        };
        let is_idle = state.entities.get(actor_id).map(|e| !crate::internal::clock::time_gt(e.busy_until, state.now)).unwrap_or(false);
        if let Some(entity) = state.entities.get_mut(actor_id) {
            entity.resource_node_id = Some(node_id.clone());
        }
        if is_idle {
            state.switch_entity_activity(actor_id, ActivityKind::Gather, &node_id, true);
        }
        assigned.push(actor_id.clone());
    }

    Ok(assigned)
}

fn current_worker_count(state: &SimState, node_id: &str) -> usize {
    state.entities.values().filter(|e| e.resource_node_id.as_deref() == Some(node_id)).count()
}

fn next_available_node(state: &SimState, targets: &[String], cursor: &mut HashMap<String, usize>) -> Option<String> {
    for node_id in targets {
        let Some(node) = state.nodes.get(node_id) else { continue };
        if node.depleted {
            continue;
        }
        let assigned_so_far = *cursor.get(node_id).unwrap_or(&0);
        let current = current_worker_count(state, node_id) + assigned_so_far;
        if !node.at_capacity(current) {
            *cursor.entry(node_id.clone()).or_insert(0) += 1;
            return Some(node_id.clone());
        }
    }
    None
}

/// Apply a standing `setSpawnGather` rule to a freshly created entity
///.
pub fn assign_gather_for_spawn(state: &mut SimState, entity_id: &str, rule: &SpawnGatherRule) {
    let targets = resolve_node_set_sorted(state, &rule.resource_node_ids, &rule.resource_node_selectors);
    let mut cursor = HashMap::new();
    if let Some(node_id) = next_available_node(state, &targets, &mut cursor) {
        if let Some(entity) = state.entities.get_mut(entity_id) {
            entity.resource_node_id = Some(node_id.clone());
        }
        state.switch_entity_activity(entity_id, ActivityKind::Gather, &node_id, true);
    }
}

/// `assignEventGather`: a one-shot gather assignment scoped to the actors
/// of the trigger event that fired it (plus, via `id:created`, any
/// resource nodes that event's completion created), rather than a
/// standing rule applied to the whole idle population. `mode: every` with
/// no actors in context is a silent no-op (the trigger fired with nothing
/// to assign this time); `mode: once` with no actors is an
/// `INVALID_ASSIGNMENT`, since a one-shot rule that never gets to run is a
/// configuration mistake.
pub fn assign_event_gather(
    state: &mut SimState,
    node_ids: &[String],
    node_selectors: &[String],
    ctx: &crate::internal::state::TriggerEventContext,
) -> Result<Vec<String>, (ViolationCode, String)> {
    if ctx.actors.is_empty() {
        if ctx.mode == crate::public::program::TriggerMode::Once {
            return Err((ViolationCode::InvalidAssignment, "assignEventGather fired with no actors in its trigger's event context".into()));
        }
        return Ok(Vec::new());
    }

    let targets = resolve_node_set_sorted_for_event(state, node_ids, node_selectors, &ctx.created_node_ids);
    if targets.is_empty() {
        return Err((ViolationCode::NoResource, "assignEventGather matched no resource nodes".into()));
    }

    let mut ranked = ctx.actors.clone();
    ranked.sort_by(|a, b| crate::internal::natural_sort::cmp(a, b));

    let mut assigned = Vec::new();
    let mut cursor = HashMap::new();
    for entity_id in ranked {
        let Some(node_id) = next_available_node(state, &targets, &mut cursor) else {
            break;
        };
        let is_idle = state.entities.get(&entity_id).map(|e| !crate::internal::clock::time_gt(e.busy_until, state.now)).unwrap_or(false);
        if let Some(entity) = state.entities.get_mut(&entity_id) {
            entity.resource_node_id = Some(node_id.clone());
        }
        if is_idle {
            state.switch_entity_activity(&entity_id, ActivityKind::Gather, &node_id, true);
        }
        assigned.push(entity_id);
    }

    Ok(assigned)
}

/// Compute the blocked-wake-time for a queue/auto-queue rule that just
/// failed with `code`. Resource stalls wake when the economy's
/// current accrual rate would clear the deficit; actor/node stalls poll
/// every tick, since new actors or nodes can appear at any time from other
/// commands.
pub fn blocked_wake_time(state: &SimState, code: ViolationCode, action: &ActionDef) -> f64 {
    let poll_next_tick = crate::internal::clock::to_future_tick(state.now + crate::internal::clock::TIME_STEP_SECONDS);

    if code == ViolationCode::InsufficientResources || code == ViolationCode::Housed {
        let cost = effective_cost(state, action);
        let snapshot = compute_snapshot(state);
        let mut candidate = poll_next_tick;
        for (resource, amount) in &cost {
            let available = state.resources.get(resource).copied().unwrap_or(0.0);
            let floor = state.resource_floor(resource);
            let deficit = amount - (available - floor);
            if deficit <= 0.0 {
                continue;
            }
            let rate = snapshot.gather_rates.get(resource).copied().unwrap_or(0.0);
            if rate > crate::internal::clock::EPS {
                let wake = crate::internal::clock::to_future_tick(state.now + deficit / rate);
                if time_lt(candidate, wake) {
                    candidate = wake;
                }
            }
        }
        return candidate;
    }

    poll_next_tick
}

/// Attempt every due `queueAction` rule once. A rule that
/// succeeds either advances to its next iteration or, once exhausted, is
/// dropped. A rule that fails in non-strict mode is rescheduled at its
/// blocked-wake time and its reason recorded, but no warning is raised yet --
/// a rule blocked for the whole remaining run only warns once, at evaluation
/// horizon (see `finalize_queue_rules`). In strict mode, an
/// `INSUFFICIENT_RESOURCES`/`HOUSED` block is instead fatal to the rule
/// right away: one warning, one failed command-result per remaining
/// iteration, and the rule is dropped without further retries. A successful
/// iteration's next attempt is pushed out by the configured human-delay for
/// the action, sampled fresh each time.
pub fn pump_queue_rules(state: &mut SimState, rng: &mut dyn HumanDelayRng) {
    let due: Vec<usize> = state
        .queue_rules
        .iter()
        .enumerate()
        .filter(|(_, r)| !crate::internal::clock::time_lt(state.now, r.next_attempt_at))
        .map(|(i, _)| i)
        .collect();

    for idx in due {
        let rule = state.queue_rules[idx].clone();
        let outcome = try_schedule_action_now(
            state,
            rule.source_command_index,
            &rule.action_id,
            rule.actor_selectors.as_deref(),
            &rule.actor_resource_node_ids,
            &rule.actor_resource_node_selectors,
        );
        if state.debug_enabled_for(&rule.action_id) {
            tracing::debug!(action_id = %rule.action_id, time = state.now, outcome = ?outcome, "queue rule attempt");
        }
        match outcome {
            ScheduleOutcome::Scheduled { .. } => {
                crate::internal::commands::record_schedule_outcome(state, rule.source_command_index, &outcome);
                let ScheduleOutcome::Scheduled { completion_time, .. } = outcome else { unreachable!() };
                if let Some(blocked_since) = rule.blocked_since {
                    if state.now - blocked_since > 30.0 + crate::internal::clock::EPS {
                        state.warn_at(
                            ViolationCode::DelayedAction,
                            completion_time,
                            format!("{} was blocked for {:.2}s before it could be scheduled", rule.action_id, state.now - blocked_since),
                        );
                    }
                }
                let delay = human_delay_sample(&rule.action_id, &state.human_delays, rng);
                let delay_until = crate::internal::clock::to_future_tick(completion_time + delay);
                let r = &mut state.queue_rules[idx];
                r.completed_iterations += 1;
                r.next_attempt_at = delay_until;
                r.delay_until = delay_until;
                r.requested_at = delay_until;
                r.last_blocked_reason = None;
                r.first_blocked_message = None;
                r.blocked_since = None;
            }
            ScheduleOutcome::Blocked { code, message } => {
                let strict_terminal = state.strict && matches!(code, ViolationCode::InsufficientResources | ViolationCode::Housed);
                if strict_terminal {
                    let remaining = rule.total_iterations.saturating_sub(rule.completed_iterations);
                    state.warn(code, message.clone());
                    for _ in 0..remaining {
                        state.record_command_result(rule.source_command_index, CommandResultOutcome::Failed { message: message.clone() });
                    }
                    state.queue_rules[idx].completed_iterations = rule.total_iterations;
                } else {
                    let action = state.actions.get(&rule.action_id).cloned();
                    let wake = action.map(|a| blocked_wake_time(state, code, &a)).unwrap_or_else(|| {
                        crate::internal::clock::to_future_tick(state.now + crate::internal::clock::TIME_STEP_SECONDS)
                    });
                    let wake = wake.max(rule.delay_until);
                    if state.debug_enabled_for(&rule.action_id) {
                        tracing::debug!(action_id = %rule.action_id, wake = wake, "queue rule rescheduled after block");
                    }
                    let r = &mut state.queue_rules[idx];
                    r.blocked_since.get_or_insert(state.now);
                    r.last_blocked_reason = Some(code);
                    r.first_blocked_message.get_or_insert(message);
                    r.next_attempt_at = wake;
                }
            }
        }
    }

    state.queue_rules.retain(|r| r.completed_iterations < r.total_iterations);
}

/// At evaluation horizon, any `queueAction` rule still holding unfinished
/// iterations emits one warning (its last-seen blocked reason, or
/// `RESOURCE_STALL` if it never got a chance to attempt) and one failed
/// command-result per remaining iteration, then is dropped.
pub fn finalize_queue_rules(state: &mut SimState) {
    let rules = std::mem::take(&mut state.queue_rules);
    for rule in rules {
        let remaining = rule.total_iterations.saturating_sub(rule.completed_iterations);
        if remaining == 0 {
            continue;
        }
        let code = rule.last_blocked_reason.unwrap_or(ViolationCode::ResourceStall);
        let message = rule
            .first_blocked_message
            .clone()
            .unwrap_or_else(|| format!("{} did not complete all iterations by the evaluation horizon", rule.action_id));
        state.warn(code, message.clone());
        for _ in 0..remaining {
            state.record_command_result(rule.source_command_index, CommandResultOutcome::Failed { message: message.clone() });
        }
    }
}

/// Attempt every due `autoQueue` rule once. Unlike `queueAction`, a
/// successful `autoQueue` rule is never exhausted -- it requeues itself
/// after every completion until a matching `stopAutoQueue` removes it. Each
/// requeue is pushed out by the action's configured human-delay, same as
/// `queueAction`.
pub fn pump_auto_queue_rules(state: &mut SimState, rng: &mut dyn HumanDelayRng) {
    let due: Vec<usize> = state
        .auto_queue_rules
        .iter()
        .enumerate()
        .filter(|(_, r)| !crate::internal::clock::time_lt(state.now, r.next_attempt_at))
        .map(|(i, _)| i)
        .collect();

    for idx in due {
        let rule = state.auto_queue_rules[idx].clone();
        let outcome = try_schedule_action_now(
            state,
            usize::MAX,
            &rule.key.action_id,
            rule.key.actor_selectors.as_deref(),
            &rule.key.actor_resource_node_ids,
            &rule.key.actor_resource_node_selectors,
        );
        if state.debug_enabled_for(&rule.key.action_id) {
            tracing::debug!(action_id = %rule.key.action_id, time = state.now, outcome = ?outcome, "auto-queue rule attempt");
        }
        match outcome {
            ScheduleOutcome::Scheduled { completion_time, .. } => {
                let delay = human_delay_sample(&rule.key.action_id, &state.human_delays, rng);
                let delay_until = crate::internal::clock::to_future_tick(completion_time + delay);
                let r = &mut state.auto_queue_rules[idx];
                // Re-fire on the very same tick, since an `autoQueue` rule is a
                // standing pool assignment: another idle actor may still be
                // available for the same action right now.
                r.next_attempt_at = state.now;
                r.delay_until = delay_until;
            }
            ScheduleOutcome::Blocked { code, .. } => {
                let action = state.actions.get(&rule.key.action_id).cloned();
                let wake = action.map(|a| blocked_wake_time(state, code, &a)).unwrap_or_else(|| {
                    crate::internal::clock::to_future_tick(state.now + crate::internal::clock::TIME_STEP_SECONDS)
                });
                let wake = wake.max(rule.delay_until);
                if state.debug_enabled_for(&rule.key.action_id) {
                    tracing::debug!(action_id = %rule.key.action_id, wake = wake, "auto-queue rule rescheduled after block");
                }
                state.auto_queue_rules[idx].next_attempt_at = wake;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::public::catalogue::GameCatalogue;
    use std::collections::HashMap as Map;

    fn catalogue_with_action() -> GameCatalogue {
        let mut actions = Map::new();
        actions.insert(
            "train_villager".to_string(),
            ActionDef {
                id: "train_villager".into(),
                actor_types: vec!["town_center".into()],
                actor_count: Some(1),
                base_duration: 25.0,
                task_type: None,
                cost: [("food".to_string(), 50.0)].into_iter().collect(),
                creates: [("villager".to_string(), 1)].into_iter().collect(),
                creates_resource_nodes: vec![],
                consumes_resource_nodes: vec![],
                resource_delta_on_complete: Map::new(),
                many_workers: None,
                modifiers_on_complete: vec![],
            },
        );
        GameCatalogue {
            resources: vec!["food".into()],
            starting_resources: [("food".to_string(), 200.0)].into_iter().collect(),
            starting_entities: vec![],
            entities: Map::new(),
            resource_node_prototypes: Map::new(),
            starting_resource_nodes: vec![],
            starting_modifiers: vec![],
            task_efficiency: Default::default(),
            population: None,
            actions,
            market: None,
        }
    }

    #[test]
    fn schedules_when_actor_and_cost_available() {
        let catalogue = catalogue_with_action();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.resources.insert("food".into(), 200.0);
        state.create_entity("town_center");

        match try_schedule_action_now(&mut state, 0, "train_villager", None, &[], &[]) {
            ScheduleOutcome::Scheduled { completion_time, actors, .. } => {
                assert_eq!(completion_time, 25.0);
                assert_eq!(actors, vec!["town_center-1".to_string()]);
            }
            ScheduleOutcome::Blocked { message, .. } => panic!("unexpected block: {message}"),
        }
        assert_eq!(*state.resources.get("food").unwrap(), 150.0);
    }

    #[test]
    fn blocks_on_missing_actor() {
        let catalogue = catalogue_with_action();
        let mut state = SimState::new(&catalogue, -30.0, false);
        match try_schedule_action_now(&mut state, 0, "train_villager", None, &[], &[]) {
            ScheduleOutcome::Blocked { code, .. } => assert_eq!(code, ViolationCode::NoActors),
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn blocks_on_insufficient_resources() {
        let catalogue = catalogue_with_action();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.resources.insert("food".into(), 10.0);
        state.create_entity("town_center");
        match try_schedule_action_now(&mut state, 0, "train_villager", None, &[], &[]) {
            ScheduleOutcome::Blocked { code, .. } => assert_eq!(code, ViolationCode::InsufficientResources),
            _ => panic!("expected block"),
        }
    }
}
