//! End-to-end build-order scenarios, run through the public API exactly as
//! a host would: a [`GameCatalogue`] plus a [`BuildOrderProgram`] in,
//! a [`SimulationResult`] out.

mod common;

use bo_sim_engine::public::catalogue::{StartingEntity, StartingResourceNode};
use bo_sim_engine::public::program::{
    ActorSpec, AssignGatherCommand, AutoQueueCommand, Command, HumanDelayConfig, NodeSpec,
    ScoreSpec, StopAutoQueueCommand,
};
use bo_sim_engine::public::result::{CommandResultOutcome, ViolationCode};
use bo_sim_engine::run_simulation;
use common::{base_program, catalogue, queue_action, run, Fixed};

/// A lone `train_villager` charges its food cost the instant it is
/// scheduled, not at completion, and its 25s base duration is scaled to 35s
/// by the default 1.4 task-efficiency factor.
#[test]
fn trains_a_single_villager_on_schedule() {
    let program = base_program(40.0, vec![queue_action(0.0, "train_villager", 1)]);
    let result = run(&program);

    assert_eq!(result.action_click_times["train_villager"], vec![0.0]);
    assert_eq!(result.action_completion_times["train_villager"], vec![35.0]);
    assert_eq!(result.completed_actions["train_villager"], 1);
    assert_eq!(result.entities_by_type["villager"], 1);
    assert_eq!(*result.resources_at_evaluation.get("food").unwrap(), 150.0);
    assert!(result.violations.is_empty());
}

/// A gatherer depletes a finite, decaying node and returns to idle on its
/// own once the stock runs out -- nothing re-assigns it.
#[test]
fn gatherer_is_released_to_idle_when_its_node_depletes() {
    let mut program = base_program(
        10.0,
        vec![Command::AssignGather(AssignGatherCommand {
            at: Some(0.0),
            after_entity_id: None,
            actor_type: "villager".into(),
            all: false,
            count: Some(1),
            actors: ActorSpec::default(),
            nodes: NodeSpec { resource_node_ids: None, resource_node_selectors: Some(vec!["proto:sheep".into()]) },
            allow_empty_selector_match: false,
        })],
    );
    program.starting_entities.push(StartingEntity { entity_type: "villager".into(), count: 1 });
    program.starting_resource_nodes.push(StartingResourceNode { prototype_id: "sheep".into(), count: 1 });
    program.scores.push(ScoreSpec::TimeDepleted { name: "sheep_depleted".into(), selector: "proto:sheep".into() });

    let result = run(&program);

    // worker rate 1.0/s + decay 2.0/s drains a 6.0 stock node in 2.0s.
    let depleted_at = result.scores.iter().find(|s| s.name == "sheep_depleted").and_then(|s| s.value);
    assert_eq!(depleted_at, Some(2.0));
    let gathered = *result.total_gathered.get("food").unwrap();
    assert!((gathered - 2.0).abs() < 1e-6, "expected ~2.0 food gathered, got {gathered}");

    let timeline = &result.entity_timelines["villager-1"];
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].start, 0.0);
    assert_eq!(timeline[0].end, 2.0);
    assert_eq!(timeline[1].start, 2.0);
    assert_eq!(timeline[1].end, 10.0);
}

/// `queueAction ... count: 2` runs its iterations back to back, one
/// `town_center` slot at a time, each charging its own food cost when it
/// actually gets scheduled rather than all at once up front.
#[test]
fn queue_action_runs_iterations_back_to_back() {
    let program = base_program(80.0, vec![queue_action(0.0, "train_villager", 2)]);
    let result = run(&program);

    assert_eq!(result.action_completion_times["train_villager"], vec![35.0, 70.0]);
    assert_eq!(result.entities_by_type["villager"], 2);
    assert_eq!(*result.resources_at_evaluation.get("food").unwrap(), 100.0);
}

/// Population capacity blocks a training the economy could otherwise
/// afford, and the rule only ever reports one `HOUSED` violation -- not one
/// per retried tick -- because it only warns once, at the evaluation
/// horizon.
#[test]
fn population_cap_blocks_training_with_a_single_housed_violation() {
    let mut program = base_program(50.0, vec![queue_action(0.0, "train_villager", 2)]);
    program.starting_entities.push(StartingEntity { entity_type: "villager".into(), count: 4 });

    let result = run(&program);

    // capacity 5 (one town_center) - 4 existing villagers = room for exactly one more.
    assert_eq!(result.entities_by_type["villager"], 5);
    assert_eq!(result.completed_actions["train_villager"], 1);

    let housed: Vec<_> = result.violations.iter().filter(|v| v.code == ViolationCode::Housed).collect();
    assert_eq!(housed.len(), 1, "expected exactly one HOUSED violation, got {}", housed.len());
    assert!(housed[0].message.contains("population capacity"));

    let failed = result.command_results.iter().filter(|r| matches!(r.outcome, CommandResultOutcome::Failed { .. })).count();
    assert_eq!(failed, 1);
}

/// A configured human delay pushes out the next `queueAction` iteration's
/// attempt by a fixed amount on top of the previous iteration's completion.
#[test]
fn human_delay_pushes_out_the_next_iteration() {
    let mut program = base_program(90.0, vec![queue_action(0.0, "train_villager", 2)]);
    program.human_delays.push(HumanDelayConfig { action_id: "train_villager".into(), min: 10.0, mode: 10.0, max: 10.0 });

    let mut rng = Fixed(0.37);
    let result = run_simulation(&catalogue(), &program, &mut rng).unwrap();

    assert_eq!(result.action_click_times["train_villager"], vec![0.0, 45.0]);
    assert_eq!(result.action_completion_times["train_villager"], vec![35.0, 80.0]);
}

/// `autoQueue` keeps training villagers back to back until explicitly
/// stopped, and re-registering the identical rule is a no-op rather than a
/// second, parallel production chain.
#[test]
fn auto_queue_trains_continuously_until_stopped() {
    let mut commands = vec![
        Command::AutoQueue(AutoQueueCommand { at: Some(0.0), action_id: "train_villager".into(), actors: ActorSpec::default() }),
        Command::AutoQueue(AutoQueueCommand { at: Some(0.0), action_id: "train_villager".into(), actors: ActorSpec::default() }),
        Command::StopAutoQueue(StopAutoQueueCommand { at: Some(80.0), action_id: "train_villager".into(), actors: ActorSpec::default() }),
    ];
    commands.sort_by(|a, b| a.declared_at().partial_cmp(&b.declared_at()).unwrap());

    let program = base_program(110.0, commands);
    let result = run(&program);

    assert_eq!(result.action_completion_times["train_villager"], vec![35.0, 70.0, 105.0]);
    assert_eq!(result.entities_by_type["villager"], 3);
}

/// The atomic cost-floor check in `try_schedule_action_now` evaluates every
/// required resource before charging any of them: an action with a cheap,
/// affordable wood cost alongside an unaffordable food cost must leave the
/// wood balance untouched when it blocks.
#[test]
fn a_blocked_multi_resource_action_charges_nothing() {
    let mut program = base_program(20.0, vec![queue_action(0.0, "overpriced", 1)]);
    program.starting_entities.push(StartingEntity { entity_type: "villager".into(), count: 1 });

    let result = run(&program);

    assert_eq!(*result.resources_at_evaluation.get("wood").unwrap(), 200.0);
    assert_eq!(*result.resources_at_evaluation.get("food").unwrap(), 200.0);
    assert_eq!(result.completed_actions.get("overpriced").copied().unwrap_or(0), 0);

    let insufficient: Vec<_> = result.violations.iter().filter(|v| v.code == ViolationCode::InsufficientResources).collect();
    assert!(!insufficient.is_empty());
}
