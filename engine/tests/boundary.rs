//! Edge-of-the-model behavior: a zero-length run, a strict-mode queue rule
//! facing an impossible cost, and a decaying node nobody ever works.

mod common;

use bo_sim_engine::public::catalogue::StartingEntity;
use bo_sim_engine::public::program::ScoreSpec;
use bo_sim_engine::public::result::{CommandResultOutcome, ViolationCode};
use bo_sim_engine::{run_simulation, NoDelay, SimError};
use common::{base_program, catalogue, queue_action, run};

/// An `evaluationTime` of zero still runs every command declared at `t=0`:
/// the command phase precedes the evaluation phase at a tied instant.
#[test]
fn zero_length_evaluation_still_runs_commands_at_time_zero() {
    let program = base_program(0.0, vec![queue_action(0.0, "train_villager", 1)]);
    let result = run(&program);

    assert_eq!(result.action_click_times["train_villager"], vec![0.0]);
    assert_eq!(result.completed_actions.get("train_villager").copied().unwrap_or(0), 0);
    assert_eq!(*result.resources_at_evaluation.get("food").unwrap(), 150.0);
}

/// With `debtFloor = 0` and `strict = true`, an action whose cost the
/// economy can never cover terminates its queue rule immediately: one
/// `INSUFFICIENT_RESOURCES` violation, one failed command result, and no
/// lingering retry.
#[test]
fn impossible_cost_in_strict_mode_terminates_the_rule_once() {
    let mut program = base_program(30.0, vec![queue_action(0.0, "overpriced", 1)]);
    program.debt_floor = 0.0;
    program.strict = true;
    program.starting_entities.push(StartingEntity { entity_type: "villager".into(), count: 1 });

    let result = run(&program);

    let insufficient: Vec<_> = result.violations.iter().filter(|v| v.code == ViolationCode::InsufficientResources).collect();
    assert_eq!(insufficient.len(), 1, "strict mode must raise exactly one violation, not one per retry");

    let failed: Vec<_> = result.command_results.iter().filter(|r| matches!(r.outcome, CommandResultOutcome::Failed { .. })).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(result.completed_actions.get("overpriced").copied().unwrap_or(0), 0);
}

/// A `decayStart: onFirstGather` node nobody ever assigns a worker to never
/// starts decaying, and therefore never depletes, no matter how long the
/// run goes on.
#[test]
fn unworked_on_first_gather_node_never_decays() {
    let mut program = base_program(1000.0, vec![]);
    program.starting_resource_nodes.push(bo_sim_engine::public::catalogue::StartingResourceNode { prototype_id: "sheep".into(), count: 1 });
    program.scores.push(ScoreSpec::TimeDepleted { name: "sheep_depleted".into(), selector: "proto:sheep".into() });

    let result = run(&program);

    let depleted_at = result.scores.iter().find(|s| s.name == "sheep_depleted").and_then(|s| s.value);
    assert_eq!(depleted_at, None, "a node nobody ever gathers from must never decay or deplete");
    assert_eq!(result.total_gathered.get("food").copied().unwrap_or(0.0), 0.0);
}

/// A `startingEntities` entry naming an entity type the catalogue never
/// defines is not a recoverable violation -- the whole run is unrunnable,
/// so it aborts with a fatal exception rather than silently creating a
/// garbage entity.
#[test]
fn unknown_starting_entity_type_is_a_fatal_error() {
    let mut program = base_program(10.0, vec![]);
    program.starting_entities.push(StartingEntity { entity_type: "dragon".into(), count: 1 });

    let mut rng = NoDelay;
    let err = run_simulation(&catalogue(), &program, &mut rng).unwrap_err();
    assert!(matches!(err, SimError::UnknownEntityType(t) if t == "dragon"));
}
