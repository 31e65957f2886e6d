//! The build-order program: a typed, already-parsed command list. The text
//! DSL that produces this value is an external collaborator; this crate
//! only consumes the typed result.

use crate::public::catalogue::{StartingEntity, StartingResourceNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selectors are `kind:value` strings resolved at simulation time by
/// `internal::selector`. Bare tokens (no `kind:` prefix) are treated as
/// `res:` selectors, and the literal token `idle` aliases to `actor:idle`
/// (see DESIGN.md, "selector aliasing").
pub type SelectorStr = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    Once,
    Every,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TriggerCondition {
    Clicked { action_id: String },
    Completed { action_id: String },
    Depleted { selector: SelectorStr },
    Exhausted { selector: SelectorStr },
}

/// The actor-selection fields shared by `queueAction`, `assignGather`, and
/// `assignEventGather`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    #[serde(rename = "actorSelectors", default)]
    pub actor_selectors: Option<Vec<SelectorStr>>,
    #[serde(rename = "actorResourceNodeIds", default)]
    pub actor_resource_node_ids: Option<Vec<String>>,
    #[serde(rename = "actorResourceNodeSelectors", default)]
    pub actor_resource_node_selectors: Option<Vec<SelectorStr>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "resourceNodeIds", default)]
    pub resource_node_ids: Option<Vec<String>>,
    #[serde(rename = "resourceNodeSelectors", default)]
    pub resource_node_selectors: Option<Vec<SelectorStr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueActionCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "afterEntityId", default)]
    pub after_entity_id: Option<String>,
    #[serde(rename = "actionId")]
    pub action_id: String,
    #[serde(default = "QueueActionCommand::default_count")]
    pub count: u32,
    #[serde(flatten)]
    pub actors: ActorSpec,
}
impl QueueActionCommand {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignGatherCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "afterEntityId", default)]
    pub after_entity_id: Option<String>,
    #[serde(rename = "actorType")]
    pub actor_type: String,
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(flatten)]
    pub actors: ActorSpec,
    #[serde(flatten)]
    pub nodes: NodeSpec,
    #[serde(rename = "allowEmptySelectorMatch", default)]
    pub allow_empty_selector_match: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignEventGatherCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "afterEntityId", default)]
    pub after_entity_id: Option<String>,
    #[serde(flatten)]
    pub nodes: NodeSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoQueueCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "actionId")]
    pub action_id: String,
    #[serde(flatten)]
    pub actors: ActorSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopAutoQueueCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "actionId")]
    pub action_id: String,
    #[serde(flatten)]
    pub actors: ActorSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSpawnGatherCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(flatten)]
    pub nodes: NodeSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantResourcesCommand {
    #[serde(default)]
    pub at: Option<f64>,
    pub resources: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntitiesCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(default = "SpawnEntitiesCommand::default_count")]
    pub count: u32,
    #[serde(flatten)]
    pub nodes: NodeSpec,
}
impl SpawnEntitiesCommand {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeResourceNodesCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "prototypeId")]
    pub prototype_id: String,
    #[serde(default = "ConsumeResourceNodesCommand::default_count")]
    pub count: u32,
}
impl ConsumeResourceNodesCommand {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResourceNodesCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(rename = "prototypeId")]
    pub prototype_id: String,
    #[serde(default = "CreateResourceNodesCommand::default_count")]
    pub count: u32,
}
impl CreateResourceNodesCommand {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddModifierCommand {
    #[serde(default)]
    pub at: Option<f64>,
    #[serde(flatten)]
    pub modifier: crate::public::catalogue::NumericModifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResourcesCommand {
    #[serde(default)]
    pub at: Option<f64>,
    pub sell: String,
    pub buy: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnTriggerCommand {
    #[serde(default)]
    pub at: Option<f64>,
    pub trigger: TriggerCondition,
    #[serde(rename = "triggerMode", default = "OnTriggerCommand::default_mode")]
    pub trigger_mode: TriggerMode,
    pub command: Box<Command>,
}
impl OnTriggerCommand {
    fn default_mode() -> TriggerMode {
        TriggerMode::Every
    }
}

/// The closed command union. The recursive
/// `OnTrigger { command: Box<Command> }` shape models nested `after ...
/// after ...` / trigger chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    QueueAction(QueueActionCommand),
    AssignGather(AssignGatherCommand),
    AssignEventGather(AssignEventGatherCommand),
    AutoQueue(AutoQueueCommand),
    StopAutoQueue(StopAutoQueueCommand),
    SetSpawnGather(SetSpawnGatherCommand),
    GrantResources(GrantResourcesCommand),
    SpawnEntities(SpawnEntitiesCommand),
    ConsumeResourceNodes(ConsumeResourceNodesCommand),
    CreateResourceNodes(CreateResourceNodesCommand),
    AddModifier(AddModifierCommand),
    TradeResources(TradeResourcesCommand),
    OnTrigger(OnTriggerCommand),
}

impl Command {
    /// The command's own declared `at`, before the "defaults to the
    /// previous command's `at`" normalization pass.
    pub fn declared_at(&self) -> Option<f64> {
        match self {
            Command::QueueAction(c) => c.at,
            Command::AssignGather(c) => c.at,
            Command::AssignEventGather(c) => c.at,
            Command::AutoQueue(c) => c.at,
            Command::StopAutoQueue(c) => c.at,
            Command::SetSpawnGather(c) => c.at,
            Command::GrantResources(c) => c.at,
            Command::SpawnEntities(c) => c.at,
            Command::ConsumeResourceNodes(c) => c.at,
            Command::CreateResourceNodes(c) => c.at,
            Command::AddModifier(c) => c.at,
            Command::TradeResources(c) => c.at,
            Command::OnTrigger(c) => c.at,
        }
    }

    pub fn set_at(&mut self, at: f64) {
        let slot = match self {
            Command::QueueAction(c) => &mut c.at,
            Command::AssignGather(c) => &mut c.at,
            Command::AssignEventGather(c) => &mut c.at,
            Command::AutoQueue(c) => &mut c.at,
            Command::StopAutoQueue(c) => &mut c.at,
            Command::SetSpawnGather(c) => &mut c.at,
            Command::GrantResources(c) => &mut c.at,
            Command::SpawnEntities(c) => &mut c.at,
            Command::ConsumeResourceNodes(c) => &mut c.at,
            Command::CreateResourceNodes(c) => &mut c.at,
            Command::AddModifier(c) => &mut c.at,
            Command::TradeResources(c) => &mut c.at,
            Command::OnTrigger(c) => &mut c.at,
        };
        *slot = Some(at);
    }
}

/// A human-delay distribution for one action: a triangular distribution
/// over `[min, max]` with the given `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanDelayConfig {
    pub action_id: String,
    pub min: f64,
    pub mode: f64,
    pub max: f64,
}

/// A named milestone to score at the evaluation horizon, e.g.
/// `score time depleted sheep`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScoreSpec {
    /// Time the named action was first clicked.
    TimeClicked { name: String, action_id: String },
    /// Time the named action last completed.
    TimeCompleted { name: String, action_id: String },
    /// Time the selector-matched node(s) were depleted (last depletion
    /// across matches; see DESIGN.md).
    TimeDepleted { name: String, selector: SelectorStr },
    /// Time every selector-matched node was depleted.
    TimeExhausted { name: String, selector: SelectorStr },
    /// The resource level at the evaluation horizon.
    ResourceAtEnd { name: String, resource: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopAfter {
    /// Stop once every named action has completed at least this many times.
    #[serde(default)]
    pub action_completions: HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOrderProgram {
    #[serde(rename = "evaluationTime")]
    pub evaluation_time: f64,
    #[serde(rename = "stopAfter", default)]
    pub stop_after: Option<StopAfter>,
    #[serde(rename = "debtFloor", default = "BuildOrderProgram::default_debt_floor")]
    pub debt_floor: f64,
    #[serde(rename = "startingResources", default)]
    pub starting_resources: HashMap<String, f64>,
    #[serde(rename = "startingEntities", default)]
    pub starting_entities: Vec<StartingEntity>,
    #[serde(rename = "startingResourceNodes", default)]
    pub starting_resource_nodes: Vec<StartingResourceNode>,
    #[serde(rename = "humanDelays", default)]
    pub human_delays: Vec<HumanDelayConfig>,
    #[serde(default)]
    pub scores: Vec<ScoreSpec>,
    pub commands: Vec<Command>,
    #[serde(rename = "strict", default)]
    pub strict: bool,
    #[serde(rename = "commandSourceLines", default)]
    pub command_source_lines: Vec<u32>,
}
impl BuildOrderProgram {
    fn default_debt_floor() -> f64 {
        -30.0
    }
}
