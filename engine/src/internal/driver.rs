//! The top-level simulation driver.
//!
//! Seeds the world from the catalogue and program, normalizes the command
//! list's `at` times, then alternates between integrating the economy up
//! to the next boundary (the next scheduled event, or an earlier node
//! depletion) and running the boundary phase processor, until the
//! evaluation horizon is reached or a `stopAfter` condition is satisfied.

use crate::internal::clock::{time_eq, time_lt, EPS};
use crate::internal::commands;
use crate::internal::economy;
use crate::internal::error::SimError;
use crate::internal::event_queue::{driver_phase, EventQueue};
use crate::internal::phases;
use crate::internal::scheduler;
use crate::internal::selector::resolve_node_set_sorted;
use crate::internal::state::SimState;
use crate::public::catalogue::GameCatalogue;
use crate::public::human_delay::HumanDelayRng;
use crate::public::program::{BuildOrderProgram, Command, ScoreSpec};
use crate::public::result::{
    ActivitySegment, CommandResult, Score, SimulationResult,
};
use std::collections::HashMap;

const MAX_ITERATIONS: u64 = 1_000_000;

enum DriverEvent {
    Command(usize, Command),
    Evaluation,
}

/// Validate the handful of references that, if wrong, make the catalogue or
/// program simply unrunnable rather than producing a recoverable violation:
/// starting entities/nodes naming a type or prototype the catalogue doesn't
/// define, and `spawnEntities` commands naming an unknown entity type.
fn validate_references(catalogue: &GameCatalogue, program: &BuildOrderProgram) -> Result<(), SimError> {
    for starting in catalogue.starting_entities.iter().chain(program.starting_entities.iter()) {
        if !catalogue.entities.contains_key(&starting.entity_type) {
            return Err(SimError::UnknownEntityType(starting.entity_type.clone()));
        }
    }
    for starting in catalogue.starting_resource_nodes.iter().chain(program.starting_resource_nodes.iter()) {
        if !catalogue.resource_node_prototypes.contains_key(&starting.prototype_id) {
            return Err(SimError::UnknownPrototype(starting.prototype_id.clone()));
        }
    }
    for cmd in &program.commands {
        if let Command::SpawnEntities(c) = cmd {
            if !catalogue.entities.contains_key(&c.entity_type) {
                return Err(SimError::UnknownEntityType(c.entity_type.clone()));
            }
        }
    }
    Ok(())
}

fn seed_state(catalogue: &GameCatalogue, program: &BuildOrderProgram) -> SimState {
    let mut state = SimState::new(catalogue, program.debt_floor, program.strict);

    for (resource, amount) in &catalogue.starting_resources {
        state.resources.insert(resource.clone(), *amount);
    }
    for (resource, amount) in &program.starting_resources {
        state.resources.insert(resource.clone(), *amount);
    }

    for starting in catalogue.starting_entities.iter().chain(program.starting_entities.iter()) {
        for _ in 0..starting.count {
            state.create_entity(&starting.entity_type);
        }
    }

    for starting in catalogue.starting_resource_nodes.iter().chain(program.starting_resource_nodes.iter()) {
        for _ in 0..starting.count {
            let _ = state.create_node(&starting.prototype_id);
        }
    }

    // `create_entity` already granted each starting entity's `providedByEntityType`
    // credit as a side effect; seeding only still needs to charge the
    // `consumedByEntityType` side, which no scheduled action did for these.
    if let Some(pop) = catalogue.population.clone() {
        let mut by_type: HashMap<String, u32> = HashMap::new();
        for e in state.entities.values() {
            *by_type.entry(e.entity_type.clone()).or_insert(0) += 1;
        }
        for (entity_type, count) in &by_type {
            if let Some(consumed) = pop.consumed_by_entity_type.get(entity_type) {
                state.charge_resource(&pop.resource, consumed * (*count as f64));
            }
        }
    }

    state.human_delays = program.human_delays.clone();

    state
}

fn normalize_and_enqueue(program: &BuildOrderProgram, queue: &mut EventQueue<DriverEvent>) {
    let mut last_at = 0.0;
    let mut commands = program.commands.clone();
    for cmd in commands.iter_mut() {
        match cmd.declared_at() {
            Some(at) => last_at = at,
            None => cmd.set_at(last_at),
        }
    }

    for (idx, cmd) in commands.into_iter().enumerate() {
        let at = cmd.declared_at().unwrap_or(0.0);
        queue.push(at, driver_phase::COMMAND, DriverEvent::Command(idx, cmd));
    }
    queue.push(program.evaluation_time, driver_phase::EVALUATION, DriverEvent::Evaluation);
}

fn dispatch_command(state: &mut SimState, idx: usize, cmd: Command) {
    if let Some(wait_for_entity) = commands::implicit_wait_target(state, &cmd) {
        state.deferred_commands.push(crate::internal::state::DeferredCommand {
            command: cmd,
            source_command_index: idx,
            wait_for_entity,
        });
        return;
    }
    commands::execute_command(state, &cmd, idx, None);
}

fn stop_after_satisfied(state: &SimState, program: &BuildOrderProgram) -> bool {
    let Some(stop) = &program.stop_after else { return false };
    stop.action_completions.iter().all(|(action_id, required)| {
        state.action_completion_times.get(action_id).map(|v| v.len() as u32).unwrap_or(0) >= *required
    })
}

/// Run one simulation end to end.
pub fn run(catalogue: &GameCatalogue, program: &BuildOrderProgram, rng: &mut dyn HumanDelayRng) -> Result<SimulationResult, SimError> {
    tracing::info!(evaluation_time = program.evaluation_time, commands = program.commands.len(), "starting simulation run");

    if let Err(err) = validate_references(catalogue, program) {
        tracing::error!(%err, "simulation aborted");
        return Err(err);
    }

    let mut state = seed_state(catalogue, program);
    let initial_resources = state.resources.clone();

    let mut queue: EventQueue<DriverEvent> = EventQueue::new();
    normalize_and_enqueue(program, &mut queue);

    let mut iterations: u64 = 0;
    let mut finished = false;

    while !finished {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            let context = "main driver loop exceeded the iteration guard".to_string();
            tracing::error!(at = state.now, %context, "simulation aborted");
            return Err(SimError::LoopGuardTripped { at: state.now, context });
        }

        let Some(next_command) = queue.peek_time() else { break };
        // A pending action completion can land strictly between two
        // command/evaluation events; the advance target must not jump past it.
        let target = match state.completions.peek_time() {
            Some(c) if time_lt(c, next_command) => c,
            _ => next_command,
        };

        economy::activate_decay_on_gather(&mut state);
        let snapshot = economy::compute_snapshot(&state);
        let depletion = economy::next_depletion_time(&state, &snapshot);
        let advance_to = match depletion {
            Some(d) if time_lt(d, target) => d,
            _ => target,
        };

        economy::advance_economy(&mut state, advance_to);
        phases::process_boundary(&mut state, rng);

        if time_eq(state.now, next_command) {
            while let Some(t) = queue.peek_time() {
                if !time_eq(t, next_command) {
                    break;
                }
                let (_, event) = queue.pop().expect("peeked event must pop");
                match event {
                    DriverEvent::Command(idx, cmd) => dispatch_command(&mut state, idx, cmd),
                    DriverEvent::Evaluation => finished = true,
                }
            }
            phases::process_boundary(&mut state, rng);
        }

        if stop_after_satisfied(&state, program) {
            finished = true;
        }
    }

    scheduler::finalize_queue_rules(&mut state);

    tracing::info!(evaluation_time = program.evaluation_time, commands = program.commands.len(), "finished simulation run");

    build_result(state, catalogue, program, initial_resources)
}

fn score_value(state: &SimState, spec: &ScoreSpec) -> Option<f64> {
    match spec {
        ScoreSpec::TimeClicked { action_id, .. } => state.action_click_times.get(action_id).and_then(|v| v.first().copied()),
        ScoreSpec::TimeCompleted { action_id, .. } => state.action_completion_times.get(action_id).and_then(|v| v.last().copied()),
        ScoreSpec::TimeDepleted { selector, .. } => last_depletion_across(state, selector, false),
        ScoreSpec::TimeExhausted { selector, .. } => last_depletion_across(state, selector, true),
        ScoreSpec::ResourceAtEnd { resource, .. } => state.resources.get(resource).copied(),
    }
}

fn last_depletion_across(state: &SimState, selector: &str, require_all: bool) -> Option<f64> {
    let ids = resolve_node_set_sorted(state, &[], &[selector.to_string()]);
    if ids.is_empty() {
        return None;
    }
    if require_all && !ids.iter().all(|id| state.nodes.get(id).map(|n| n.depleted).unwrap_or(false)) {
        return None;
    }
    ids.iter()
        .filter_map(|id| state.node_depletion_times.get(id).and_then(|t| t.first().copied()))
        .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
}

fn score_name(spec: &ScoreSpec) -> &str {
    match spec {
        ScoreSpec::TimeClicked { name, .. }
        | ScoreSpec::TimeCompleted { name, .. }
        | ScoreSpec::TimeDepleted { name, .. }
        | ScoreSpec::TimeExhausted { name, .. }
        | ScoreSpec::ResourceAtEnd { name, .. } => name,
    }
}

fn build_result(mut state: SimState, catalogue: &GameCatalogue, program: &BuildOrderProgram, initial_resources: HashMap<String, f64>) -> Result<SimulationResult, SimError> {
    for timeline in state.entity_timelines.values_mut() {
        timeline.finalize(program.evaluation_time);
    }

    let total_time = program.evaluation_time.max(EPS);
    let mut total_gathered = HashMap::new();
    let mut avg_float = HashMap::new();
    let mut debt_duration = HashMap::new();

    for resource in &catalogue.resources {
        let mut gathered = 0.0;
        let mut weighted = 0.0;
        let mut debt_seconds = 0.0;

        for row in &state.resource_timeline {
            let dt = row.end - row.start;
            let start_level = row.start_resources.get(resource).copied().unwrap_or(0.0);
            let rate = row.gather_rates.get(resource).copied().unwrap_or(0.0);
            let end_level = start_level + rate * dt;

            gathered += rate * dt;
            weighted += (start_level + end_level) / 2.0 * dt;

            debt_seconds += debt_overlap(start_level, end_level, dt);
        }

        total_gathered.insert(resource.clone(), gathered);
        avg_float.insert(resource.clone(), weighted / total_time);
        debt_duration.insert(resource.clone(), debt_seconds);
    }

    let mut peak_debt = HashMap::new();
    for (resource, min_level) in &state.max_debt {
        peak_debt.insert(resource.clone(), (-min_level).max(0.0));
    }

    let entities_by_type = entity_counts(&state);
    let entity_count_timeline = entity_count_timeline(&state);

    let completed_actions: HashMap<String, u32> = state
        .action_completion_times
        .iter()
        .map(|(action_id, times)| (action_id.clone(), times.len() as u32))
        .collect();

    let entity_timelines: HashMap<String, Vec<ActivitySegment>> =
        state.entity_timelines.iter().map(|(id, t)| (id.clone(), t.closed.clone())).collect();

    let scores: Vec<Score> = program
        .scores
        .iter()
        .map(|spec| Score {
            name: score_name(spec).to_string(),
            value: score_value(&state, spec),
        })
        .collect();

    let command_results: Vec<CommandResult> = state.command_results.clone();

    Ok(SimulationResult {
        initial_resources,
        resources_at_evaluation: state.resources.clone(),
        entities_by_type,
        total_gathered,
        avg_float,
        peak_debt,
        debt_duration,
        max_debt: state.max_debt.clone(),
        completed_actions,
        violations: state.violations.clone(),
        command_results,
        resource_timeline: state.resource_timeline.clone(),
        entity_count_timeline,
        entity_timelines,
        event_logs: Some(state.event_log.clone()),
        scores,
        action_click_times: state.action_click_times.clone(),
        action_completion_times: state.action_completion_times.clone(),
        tc_idle_time: idle_time_for_type(&state, "town_center"),
        total_villager_idle_time: total_idle_time_for_type(&state, "villager"),
    })
}

fn debt_overlap(start_level: f64, end_level: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    match (start_level < 0.0, end_level < 0.0) {
        (true, true) => dt,
        (false, false) => 0.0,
        (true, false) => {
            let slope = (end_level - start_level) / dt;
            if slope <= 0.0 {
                dt
            } else {
                (-start_level / slope).clamp(0.0, dt)
            }
        }
        (false, true) => {
            let slope = (end_level - start_level) / dt;
            if slope >= 0.0 {
                0.0
            } else {
                (dt + start_level / (-slope)).clamp(0.0, dt)
            }
        }
    }
}

fn entity_counts(state: &SimState) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for e in state.entities.values() {
        *counts.entry(e.entity_type.clone()).or_insert(0) += 1;
    }
    counts
}

fn entity_count_timeline(state: &SimState) -> Vec<(f64, HashMap<String, u32>)> {
    let mut creations: Vec<(f64, String)> = state
        .entity_timelines
        .iter()
        .map(|(id, timeline)| {
            let created_at = timeline.closed.first().map(|s| s.start).or_else(|| timeline.open.as_ref().map(|o| o.start)).unwrap_or(0.0);
            (created_at, state.entities[id].entity_type.clone())
        })
        .collect();
    creations.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut running: HashMap<String, u32> = HashMap::new();
    creations
        .into_iter()
        .map(|(t, entity_type)| {
            *running.entry(entity_type).or_insert(0) += 1;
            (t, running.clone())
        })
        .collect()
}

fn idle_time_for_type(state: &SimState, entity_type: &str) -> Option<f64> {
    let ids: Vec<&String> = state.entities.values().filter(|e| e.entity_type == entity_type).map(|e| &e.id).collect();
    if ids.is_empty() {
        return None;
    }
    Some(
        ids.iter()
            .map(|id| {
                state.entity_timelines[*id]
                    .closed
                    .iter()
                    .filter(|s| s.kind == crate::public::result::ActivityKind::Idle)
                    .map(|s| s.end - s.start)
                    .sum::<f64>()
            })
            .sum(),
    )
}

fn total_idle_time_for_type(state: &SimState, entity_type: &str) -> Option<f64> {
    idle_time_for_type(state, entity_type)
}
