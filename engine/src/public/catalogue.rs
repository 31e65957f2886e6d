//! The static game catalogue: resources, entity types, action recipes,
//! resource-node prototypes, the population model, and the optional
//! market.
//!
//! These types are plain serde-derived data. Parsing them out of a
//! catalogue file (JSON/YAML/whatever a host prefers) is outside this
//! crate's scope; a host hands the engine an already-deserialized
//! [`GameCatalogue`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Unit,
    Building,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDef {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayStart {
    OnSpawn,
    OnFirstGather,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNodePrototype {
    pub name: String,
    pub produces: String,
    #[serde(rename = "rateByEntityType", default)]
    pub rate_by_entity_type: HashMap<String, f64>,
    #[serde(rename = "maxWorkers", default)]
    pub max_workers: Option<u32>,
    #[serde(default)]
    pub stock: Option<f64>,
    #[serde(rename = "decayRatePerSecond", default)]
    pub decay_rate_per_second: Option<f64>,
    #[serde(rename = "decayStart", default)]
    pub decay_start: Option<DecayStart>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierOp {
    Mul,
    Add,
    Set,
}

/// A `(selector, op, value)` modifier. `selector` is the fully derived key
/// it matches against (e.g. `"action.duration.build_house_aoe2"`,
/// `"gather.rate.tag.forest"`) -- see `internal::modifiers` for the full
/// catalogue of key shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericModifier {
    pub selector: String,
    pub op: ModifierOp,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManyWorkersConfig {
    #[serde(default = "ManyWorkersConfig::default_rate")]
    pub additional_worker_rate: f64,
}

impl ManyWorkersConfig {
    fn default_rate() -> f64 {
        1.0 / 3.0
    }
}

impl Default for ManyWorkersConfig {
    fn default() -> Self {
        ManyWorkersConfig {
            additional_worker_rate: Self::default_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: String,
    #[serde(rename = "actorTypes")]
    pub actor_types: Vec<String>,
    #[serde(rename = "actorCount", default)]
    pub actor_count: Option<usize>,
    #[serde(rename = "baseDuration")]
    pub base_duration: f64,
    #[serde(rename = "taskType", default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub cost: HashMap<String, f64>,
    #[serde(default)]
    pub creates: HashMap<String, u32>,
    #[serde(rename = "createsResourceNodes", default)]
    pub creates_resource_nodes: Vec<CreatesResourceNodeSpec>,
    #[serde(rename = "consumesResourceNodes", default)]
    pub consumes_resource_nodes: Vec<ConsumesResourceNodeSpec>,
    #[serde(rename = "resourceDeltaOnComplete", default)]
    pub resource_delta_on_complete: HashMap<String, f64>,
    #[serde(rename = "manyWorkers", default)]
    pub many_workers: Option<ManyWorkersKind>,
    #[serde(rename = "modifiersOnComplete", default)]
    pub modifiers_on_complete: Vec<NumericModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ManyWorkersKind {
    /// `1 + (workerCount - 1) * additional_worker_rate` duration divisor.
    Aoe2(ManyWorkersConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatesResourceNodeSpec {
    #[serde(rename = "prototypeId")]
    pub prototype_id: String,
    #[serde(default = "CreatesResourceNodeSpec::default_count")]
    pub count: u32,
}
impl CreatesResourceNodeSpec {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumesResourceNodeSpec {
    #[serde(rename = "prototypeId")]
    pub prototype_id: String,
    #[serde(default = "ConsumesResourceNodeSpec::default_count")]
    pub count: u32,
}
impl ConsumesResourceNodeSpec {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEfficiency {
    #[serde(default = "TaskEfficiency::default_default")]
    pub default_efficiency: f64,
    #[serde(rename = "byTaskType", default)]
    pub by_task_type: HashMap<String, f64>,
}
impl TaskEfficiency {
    fn default_default() -> f64 {
        1.4
    }

    pub fn factor_for(&self, task_type: Option<&str>) -> f64 {
        task_type
            .and_then(|t| self.by_task_type.get(t))
            .copied()
            .unwrap_or(self.default_efficiency)
    }
}
impl Default for TaskEfficiency {
    fn default() -> Self {
        TaskEfficiency {
            default_efficiency: Self::default_default(),
            by_task_type: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub resource: String,
    #[serde(rename = "providedByEntityType")]
    pub provided_by_entity_type: HashMap<String, f64>,
    #[serde(rename = "consumedByEntityType")]
    pub consumed_by_entity_type: HashMap<String, f64>,
    #[serde(default)]
    pub floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "MarketConfig::default_fee")]
    pub fee: f64,
    #[serde(rename = "minExchangeRate", default)]
    pub min_exchange_rate: Option<f64>,
    #[serde(rename = "maxExchangeRate", default)]
    pub max_exchange_rate: Option<f64>,
    #[serde(rename = "rateStep", default = "MarketConfig::default_rate_step")]
    pub rate_step: f64,
    #[serde(rename = "baseRates", default)]
    pub base_rates: HashMap<String, f64>,
}
impl MarketConfig {
    fn default_fee() -> f64 {
        0.3
    }
    fn default_rate_step() -> f64 {
        0.01
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingResourceNode {
    #[serde(rename = "prototypeId")]
    pub prototype_id: String,
    #[serde(default = "StartingResourceNode::default_count")]
    pub count: u32,
}
impl StartingResourceNode {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingEntity {
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(default = "StartingEntity::default_count")]
    pub count: u32,
}
impl StartingEntity {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameCatalogue {
    pub resources: Vec<String>,
    #[serde(rename = "startingResources", default)]
    pub starting_resources: HashMap<String, f64>,
    #[serde(rename = "startingEntities", default)]
    pub starting_entities: Vec<StartingEntity>,
    pub entities: HashMap<String, EntityTypeDef>,
    #[serde(rename = "resourceNodePrototypes")]
    pub resource_node_prototypes: HashMap<String, ResourceNodePrototype>,
    #[serde(rename = "startingResourceNodes", default)]
    pub starting_resource_nodes: Vec<StartingResourceNode>,
    #[serde(rename = "startingModifiers", default)]
    pub starting_modifiers: Vec<NumericModifier>,
    #[serde(rename = "taskEfficiency", default)]
    pub task_efficiency: TaskEfficiency,
    #[serde(default)]
    pub population: Option<PopulationConfig>,
    pub actions: HashMap<String, ActionDef>,
    #[serde(default)]
    pub market: Option<MarketConfig>,
}
