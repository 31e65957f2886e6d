//! Shared fixture for the integration tests: a small villager/house/town
//! center catalogue with one finite decaying food node (`sheep`) and one
//! infinite wood node (`forest`).

use bo_sim_engine::public::catalogue::{
    ActionDef, DecayStart, EntityKind, EntityTypeDef, GameCatalogue, ManyWorkersConfig,
    ManyWorkersKind, PopulationConfig, ResourceNodePrototype, StartingEntity, TaskEfficiency,
};
use bo_sim_engine::public::program::{ActorSpec, BuildOrderProgram, Command, QueueActionCommand};
use bo_sim_engine::{run_simulation, HumanDelayRng, NoDelay, SimulationResult};
use std::collections::HashMap;

pub fn entities() -> HashMap<String, EntityTypeDef> {
    [
        (
            "town_center".to_string(),
            EntityTypeDef {
                name: "town_center".into(),
                kind: EntityKind::Building,
                actions: vec!["train_villager".into()],
            },
        ),
        (
            "villager".to_string(),
            EntityTypeDef {
                name: "villager".into(),
                kind: EntityKind::Unit,
                actions: vec!["build_house".into(), "build_house_aoe2".into()],
            },
        ),
        (
            "house".to_string(),
            EntityTypeDef {
                name: "house".into(),
                kind: EntityKind::Building,
                actions: vec![],
            },
        ),
    ]
    .into_iter()
    .collect()
}

pub fn node_prototypes() -> HashMap<String, ResourceNodePrototype> {
    [
        (
            "sheep".to_string(),
            ResourceNodePrototype {
                name: "sheep".into(),
                produces: "food".into(),
                rate_by_entity_type: [("villager".to_string(), 1.0)].into_iter().collect(),
                max_workers: Some(1),
                stock: Some(6.0),
                decay_rate_per_second: Some(2.0),
                decay_start: Some(DecayStart::OnFirstGather),
                tags: vec!["food".into()],
            },
        ),
        (
            "forest".to_string(),
            ResourceNodePrototype {
                name: "forest".into(),
                produces: "wood".into(),
                rate_by_entity_type: [("villager".to_string(), 1.0)].into_iter().collect(),
                max_workers: Some(4),
                stock: None,
                decay_rate_per_second: None,
                decay_start: None,
                tags: vec!["wood".into()],
            },
        ),
    ]
    .into_iter()
    .collect()
}

pub fn actions() -> HashMap<String, ActionDef> {
    let mut actions = HashMap::new();
    actions.insert(
        "train_villager".to_string(),
        ActionDef {
            id: "train_villager".into(),
            actor_types: vec!["town_center".into()],
            actor_count: Some(1),
            base_duration: 25.0,
            task_type: Some("train".into()),
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
            base_duration: 24.0,
            task_type: Some("build".into()),
            cost: [("wood".to_string(), 25.0)].into_iter().collect(),
            creates: [("house".to_string(), 1)].into_iter().collect(),
            creates_resource_nodes: vec![],
            consumes_resource_nodes: vec![],
            resource_delta_on_complete: HashMap::new(),
            many_workers: None,
            modifiers_on_complete: vec![],
        },
    );
    actions.insert(
        "build_house_aoe2".to_string(),
        ActionDef {
            id: "build_house_aoe2".into(),
            actor_types: vec!["villager".into()],
            actor_count: Some(3),
            base_duration: 30.0,
            task_type: None,
            cost: [("wood".to_string(), 25.0)].into_iter().collect(),
            creates: [("house".to_string(), 1)].into_iter().collect(),
            creates_resource_nodes: vec![],
            consumes_resource_nodes: vec![],
            resource_delta_on_complete: HashMap::new(),
            many_workers: Some(ManyWorkersKind::Aoe2(ManyWorkersConfig::default())),
            modifiers_on_complete: vec![],
        },
    );
    actions.insert(
        "overpriced".to_string(),
        ActionDef {
            id: "overpriced".into(),
            actor_types: vec!["villager".into()],
            actor_count: Some(1),
            base_duration: 5.0,
            task_type: None,
            cost: [("wood".to_string(), 5.0), ("food".to_string(), 1000.0)].into_iter().collect(),
            creates: HashMap::new(),
            creates_resource_nodes: vec![],
            consumes_resource_nodes: vec![],
            resource_delta_on_complete: HashMap::new(),
            many_workers: None,
            modifiers_on_complete: vec![],
        },
    );
    actions
}

pub fn population() -> PopulationConfig {
    PopulationConfig {
        resource: "population".into(),
        provided_by_entity_type: [("town_center".to_string(), 5.0), ("house".to_string(), 5.0)].into_iter().collect(),
        consumed_by_entity_type: [("villager".to_string(), 1.0)].into_iter().collect(),
        floor: 0.0,
    }
}

pub fn catalogue() -> GameCatalogue {
    GameCatalogue {
        resources: vec!["food".into(), "wood".into()],
        starting_resources: [("food".to_string(), 200.0), ("wood".to_string(), 200.0)].into_iter().collect(),
        starting_entities: vec![StartingEntity { entity_type: "town_center".into(), count: 1 }],
        entities: entities(),
        resource_node_prototypes: node_prototypes(),
        starting_resource_nodes: vec![],
        starting_modifiers: vec![],
        task_efficiency: TaskEfficiency::default(),
        population: Some(population()),
        actions: actions(),
        market: None,
    }
}

pub fn queue_action(at: f64, action_id: &str, count: u32) -> Command {
    Command::QueueAction(QueueActionCommand {
        at: Some(at),
        after_entity_id: None,
        action_id: action_id.into(),
        count,
        actors: ActorSpec::default(),
    })
}

pub fn base_program(evaluation_time: f64, commands: Vec<Command>) -> BuildOrderProgram {
    BuildOrderProgram {
        evaluation_time,
        stop_after: None,
        debt_floor: -30.0,
        starting_resources: HashMap::new(),
        starting_entities: vec![],
        starting_resource_nodes: vec![],
        human_delays: vec![],
        scores: vec![],
        commands,
        strict: false,
        command_source_lines: vec![],
    }
}

pub fn run(program: &BuildOrderProgram) -> SimulationResult {
    let mut rng = NoDelay;
    run_simulation(&catalogue(), program, &mut rng).expect("simulation should not raise a fatal error")
}

pub struct Fixed(pub f64);
impl HumanDelayRng for Fixed {
    fn sample_unit(&mut self) -> f64 {
        self.0
    }
}
