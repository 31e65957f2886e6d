//! A small AoE2-flavored build order, run end to end against the engine and
//! printed to the console. Demonstrates wiring a catalogue and a program by
//! hand rather than through a parser.

use bo_sim_engine::public::catalogue::{
    ActionDef, DecayStart, EntityKind, EntityTypeDef, GameCatalogue, ManyWorkersConfig, ManyWorkersKind, PopulationConfig, ResourceNodePrototype,
    StartingEntity, StartingResourceNode,
};
use bo_sim_engine::public::program::{ActorSpec, Command, NodeSpec, QueueActionCommand};
use bo_sim_engine::public::result::SimulationResult;
use bo_sim_engine::{run_simulation, BuildOrderProgram, NoDelay};
use std::collections::HashMap;

fn catalogue() -> GameCatalogue {
    let mut entities = HashMap::new();
    entities.insert(
        "villager".to_string(),
        EntityTypeDef {
            name: "villager".into(),
            kind: EntityKind::Unit,
            actions: vec![],
        },
    );
    entities.insert(
        "town_center".to_string(),
        EntityTypeDef {
            name: "town_center".into(),
            kind: EntityKind::Building,
            actions: vec!["train_villager".into()],
        },
    );
    entities.insert(
        "house".to_string(),
        EntityTypeDef {
            name: "house".into(),
            kind: EntityKind::Building,
            actions: vec![],
        },
    );

    let mut resource_node_prototypes = HashMap::new();
    resource_node_prototypes.insert(
        "sheep".to_string(),
        ResourceNodePrototype {
            name: "sheep".into(),
            produces: "food".into(),
            rate_by_entity_type: [("villager".to_string(), 0.5)].into_iter().collect(),
            max_workers: Some(1),
            stock: Some(100.0),
            decay_rate_per_second: None,
            decay_start: None,
            tags: vec![],
        },
    );
    resource_node_prototypes.insert(
        "forest".to_string(),
        ResourceNodePrototype {
            name: "forest".into(),
            produces: "wood".into(),
            rate_by_entity_type: [("villager".to_string(), 0.3)].into_iter().collect(),
            max_workers: Some(4),
            stock: None,
            decay_rate_per_second: None,
            decay_start: Some(DecayStart::OnFirstGather),
            tags: vec!["forest".into()],
        },
    );

    let mut actions = HashMap::new();
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
            resource_delta_on_complete: HashMap::new(),
            many_workers: None,
            modifiers_on_complete: vec![],
        },
    );
    actions.insert(
        "build_house".to_string(),
        ActionDef {
            id: "build_house".into(),
            actor_types: vec!["villager".into()],
            actor_count: Some(1),
            base_duration: 25.0,
            task_type: Some("build".into()),
            cost: [("wood".to_string(), 25.0)].into_iter().collect(),
            creates: [("house".to_string(), 1)].into_iter().collect(),
            creates_resource_nodes: vec![],
            consumes_resource_nodes: vec![],
            resource_delta_on_complete: HashMap::new(),
            many_workers: Some(ManyWorkersKind::Aoe2(ManyWorkersConfig::default())),
            modifiers_on_complete: vec![],
        },
    );

    GameCatalogue {
        resources: vec!["food".into(), "wood".into(), "population".into()],
        starting_resources: [("food".to_string(), 200.0), ("wood".to_string(), 200.0)].into_iter().collect(),
        starting_entities: vec![StartingEntity {
            entity_type: "town_center".into(),
            count: 1,
        }],
        entities,
        resource_node_prototypes,
        starting_resource_nodes: vec![
            StartingResourceNode {
                prototype_id: "sheep".into(),
                count: 1,
            },
            StartingResourceNode {
                prototype_id: "forest".into(),
                count: 1,
            },
        ],
        starting_modifiers: vec![],
        task_efficiency: Default::default(),
        population: Some(PopulationConfig {
            resource: "population".into(),
            provided_by_entity_type: [("town_center".to_string(), 5.0), ("house".to_string(), 5.0)].into_iter().collect(),
            consumed_by_entity_type: [("villager".to_string(), 1.0)].into_iter().collect(),
            floor: 0.0,
        }),
        actions,
        market: None,
    }
}

fn program() -> BuildOrderProgram {
    let queue = |at: f64, action_id: &str| {
        Command::QueueAction(QueueActionCommand {
            at: Some(at),
            after_entity_id: None,
            action_id: action_id.to_string(),
            count: 1,
            actors: ActorSpec::default(),
        })
    };

    BuildOrderProgram {
        evaluation_time: 300.0,
        stop_after: None,
        debt_floor: -30.0,
        starting_resources: HashMap::new(),
        starting_entities: vec![],
        starting_resource_nodes: vec![],
        human_delays: vec![],
        scores: vec![],
        commands: vec![
            queue(0.0, "train_villager"),
            queue(25.0, "train_villager"),
            queue(50.0, "train_villager"),
            Command::AssignGather(bo_sim_engine::public::program::AssignGatherCommand {
                at: Some(75.0),
                after_entity_id: None,
                actor_type: "villager".into(),
                all: true,
                count: None,
                actors: ActorSpec::default(),
                nodes: NodeSpec {
                    resource_node_ids: None,
                    resource_node_selectors: Some(vec!["proto:forest".to_string()]),
                },
                allow_empty_selector_match: false,
            }),
        ],
        strict: false,
        command_source_lines: vec![],
    }
}

fn print_summary(result: &SimulationResult) {
    println!("resources at evaluation: {:?}", result.resources_at_evaluation);
    println!("entities by type: {:?}", result.entities_by_type);
    println!("completed actions: {:?}", result.completed_actions);
    println!("violations: {}", result.violations.len());
    for v in &result.violations {
        println!("  [{:?} @ {:.1}] {}", v.code, v.time, v.message);
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let catalogue = catalogue();
    let program = program();
    let mut rng = NoDelay;

    match run_simulation(&catalogue, &program, &mut rng) {
        Ok(result) => print_summary(&result),
        Err(err) => eprintln!("simulation failed: {err}"),
    }
}
