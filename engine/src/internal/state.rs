//! The single mutable world state. Every component takes `&mut SimState` (or `&SimState` for
//! read-only queries) as an explicit parameter -- there is no process-wide
//! state; one run owns exactly one `SimState`.

use crate::internal::entity::{EntityInstance, EntityTimeline};
use crate::internal::event_queue::EventQueue;
use crate::internal::node::ResourceNodeInstance;
use crate::public::catalogue::{
    ActionDef, EntityTypeDef, GameCatalogue, MarketConfig, NumericModifier, PopulationConfig,
    ResourceNodePrototype, TaskEfficiency,
};
use crate::public::program::{Command, HumanDelayConfig, TriggerCondition, TriggerMode};
use crate::public::result::{CommandResult, EventLogEntry, ResourceTimelineRow, Violation, ViolationCode};
use std::collections::HashMap;

/// A scheduled action's completion, queued at `completion_time` under
/// `boundary_phase::COMPLETION`.
#[derive(Debug, Clone)]
pub struct PendingCompletion {
    pub source_command_index: usize,
    pub action_id: String,
    pub actors: Vec<String>,
    pub started_at: f64,
}

#[derive(Debug, Clone)]
pub struct QueueRule {
    pub source_command_index: usize,
    pub action_id: String,
    pub total_iterations: u32,
    pub completed_iterations: u32,
    pub actor_selectors: Option<Vec<String>>,
    pub actor_resource_node_ids: Vec<String>,
    pub actor_resource_node_selectors: Vec<String>,
    pub next_attempt_at: f64,
    pub delay_until: f64,
    pub requested_at: f64,
    pub last_blocked_reason: Option<ViolationCode>,
    pub first_blocked_message: Option<String>,
    pub blocked_since: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AutoQueueKey {
    pub action_id: String,
    pub actor_selectors: Option<Vec<String>>,
    pub actor_resource_node_ids: Vec<String>,
    pub actor_resource_node_selectors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AutoQueueRule {
    pub key: AutoQueueKey,
    pub next_attempt_at: f64,
    pub delay_until: f64,
}

#[derive(Debug, Clone)]
pub struct TriggerRule {
    pub condition: TriggerCondition,
    pub mode: TriggerMode,
    pub inner_command: Command,
    pub source_command_index: usize,
    pub has_fired: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SpawnGatherRule {
    pub resource_node_ids: Vec<String>,
    pub resource_node_selectors: Vec<String>,
}

/// A deferred command, waiting on an entity to exist.
#[derive(Debug, Clone)]
pub struct DeferredCommand {
    pub command: Command,
    pub source_command_index: usize,
    pub wait_for_entity: String,
}

#[derive(Debug, Clone)]
pub struct MarketRuntime {
    pub config: MarketConfig,
    /// Cumulative `±rateStep` adjustment applied to each resource's
    /// effective exchange rate after each trade.
    pub rate_adjustments: HashMap<String, f64>,
}

/// "Trigger event" context passed into [`crate::internal::trigger`]
/// matching and on into the inner command when it fires: the actors
/// involved in the event that fired the trigger, any resource nodes its
/// completion created, and the rule's own mode (needed by
/// `assignEventGather` to tell a genuine no-actors `every` no-op from an
/// `once` rule that fired with nothing to assign).
#[derive(Debug, Clone)]
pub struct TriggerEventContext {
    pub actors: Vec<String>,
    pub created_node_ids: Vec<String>,
    pub mode: TriggerMode,
}

/// A `clicked` event: an action's scheduling attempt succeeded and put
/// these actors to work.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub action_id: String,
    pub time: f64,
    pub actors: Vec<String>,
}

/// A `completed` event: an action finished, possibly creating resource
/// nodes along the way.
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub action_id: String,
    pub time: f64,
    pub actors: Vec<String>,
    pub created_node_ids: Vec<String>,
}

/// A `depleted`/`exhausted` event: a resource node ran dry, along with
/// whichever actors were gathering from it at that instant (empty for a
/// decay-only depletion with no active gatherers).
#[derive(Debug, Clone)]
pub struct DepletionEvent {
    pub node_id: String,
    pub time: f64,
    pub actors: Vec<String>,
}

pub struct SimState {
    pub now: f64,

    // catalogue, held for the life of the run
    pub actions: HashMap<String, ActionDef>,
    pub entity_type_defs: HashMap<String, EntityTypeDef>,
    pub node_prototypes: HashMap<String, ResourceNodePrototype>,
    pub catalogue_resources: Vec<String>,
    pub task_efficiency: TaskEfficiency,
    pub population: Option<PopulationConfig>,
    pub market: Option<MarketRuntime>,
    /// Per-action human-reaction-time distributions, consulted
    /// every time a queue/auto-queue rule requeues itself after a success.
    pub human_delays: Vec<HumanDelayConfig>,

    // mutable economy
    pub resources: HashMap<String, f64>,
    pub resource_floors: HashMap<String, f64>,
    pub debt_floor: f64,
    pub max_debt: HashMap<String, f64>,
    pub modifiers: Vec<NumericModifier>,

    // entities & nodes
    pub entities: HashMap<String, EntityInstance>,
    pub entity_timelines: HashMap<String, EntityTimeline>,
    entity_type_counters: HashMap<String, u64>,
    pub nodes: HashMap<String, ResourceNodeInstance>,
    node_counters: HashMap<String, u64>,

    // rules
    pub queue_rules: Vec<QueueRule>,
    pub auto_queue_rules: Vec<AutoQueueRule>,
    pub trigger_rules: Vec<TriggerRule>,
    pub spawn_gather_rules: HashMap<String, SpawnGatherRule>,
    pub deferred_commands: Vec<DeferredCommand>,
    pub completions: EventQueue<PendingCompletion>,

    // records
    pub resource_timeline: Vec<ResourceTimelineRow>,
    pub event_log: Vec<EventLogEntry>,
    pub action_click_times: HashMap<String, Vec<f64>>,
    pub action_completion_times: HashMap<String, Vec<f64>>,
    pub node_depletion_times: HashMap<String, Vec<f64>>,
    /// Full click/completion/depletion history, carrying the actor (and,
    /// for completions, created-node) context each event fired with --
    /// consulted by the trigger engine to build a firing rule's
    /// [`TriggerEventContext`], and by `onTrigger` registration to detect
    /// a condition that already matched in the past.
    pub click_events: Vec<ClickEvent>,
    pub completion_events: Vec<CompletionEvent>,
    pub depletion_events: Vec<DepletionEvent>,
    pub violations: Vec<Violation>,
    pub command_results: Vec<CommandResult>,

    pub strict: bool,

    /// Read once from the `SIM_DEBUG` environment variable at construction.
    /// Gates `tracing::debug!` call sites in the scheduler so the engine
    /// never pays for formatting a debug message nobody asked to see.
    pub sim_debug: bool,

    /// `SIM_DEBUG=<action_id>` narrows the debug channel to just that
    /// action; `SIM_DEBUG` set to anything else (including empty) debugs
    /// every action.
    pub sim_debug_action_filter: Option<String>,
}

impl SimState {
    pub fn new(catalogue: &GameCatalogue, debt_floor: f64, strict: bool) -> Self {
        let mut resource_floors = HashMap::new();
        if let Some(pop) = &catalogue.population {
            resource_floors.insert(pop.resource.clone(), pop.floor);
        }

        SimState {
            now: 0.0,
            actions: catalogue.actions.clone(),
            entity_type_defs: catalogue.entities.clone(),
            node_prototypes: catalogue.resource_node_prototypes.clone(),
            catalogue_resources: catalogue.resources.clone(),
            task_efficiency: catalogue.task_efficiency.clone(),
            population: catalogue.population.clone(),
            market: catalogue.market.clone().map(|config| MarketRuntime {
                config,
                rate_adjustments: HashMap::new(),
            }),
            human_delays: Vec::new(),

            resources: HashMap::new(),
            resource_floors,
            debt_floor,
            max_debt: HashMap::new(),
            modifiers: catalogue.starting_modifiers.clone(),

            entities: HashMap::new(),
            entity_timelines: HashMap::new(),
            entity_type_counters: HashMap::new(),
            nodes: HashMap::new(),
            node_counters: HashMap::new(),

            queue_rules: Vec::new(),
            auto_queue_rules: Vec::new(),
            trigger_rules: Vec::new(),
            spawn_gather_rules: HashMap::new(),
            deferred_commands: Vec::new(),
            completions: EventQueue::new(),

            resource_timeline: Vec::new(),
            event_log: Vec::new(),
            action_click_times: HashMap::new(),
            action_completion_times: HashMap::new(),
            node_depletion_times: HashMap::new(),
            click_events: Vec::new(),
            completion_events: Vec::new(),
            depletion_events: Vec::new(),
            violations: Vec::new(),
            command_results: Vec::new(),

            strict,
            sim_debug: std::env::var("SIM_DEBUG").is_ok(),
            sim_debug_action_filter: std::env::var("SIM_DEBUG").ok().filter(|v| !v.is_empty() && v != "1" && v != "true"),
        }
    }

    /// Whether a `tracing::debug!` call site concerning `action_id` should
    /// actually log, per `SIM_DEBUG`'s single channel + optional action
    /// filter (see the field docs above).
    pub fn debug_enabled_for(&self, action_id: &str) -> bool {
        self.sim_debug && self.sim_debug_action_filter.as_deref().is_none_or(|filter| filter == action_id)
    }

    pub fn warn(&mut self, code: ViolationCode, message: impl Into<String>) {
        self.warn_at(code, self.now, message);
    }

    /// Like [`Self::warn`], but stamped with an explicit time rather than
    /// `self.now` -- used for violations discovered only in hindsight
    /// (e.g. `DELAYED_ACTION`, raised once a blocked iteration finally
    /// schedules, but timestamped at its completion).
    pub fn warn_at(&mut self, code: ViolationCode, time: f64, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code = ?code, time, "{message}");
        self.violations.push(Violation { code, time, message });
    }

    pub fn charge_resource(&mut self, resource: &str, amount: f64) {
        let before = *self.resources.get(resource).unwrap_or(&0.0);
        let after = before - amount;
        self.resources.insert(resource.to_string(), after);

        let entry = self.max_debt.entry(resource.to_string()).or_insert(before);
        if after < *entry {
            *entry = after;
        }

        if before >= 0.0 && after < 0.0 {
            self.warn(
                ViolationCode::NegativeResource,
                format!("{resource} went negative ({after:.2}) after a charge of {amount:.2}"),
            );
        }
    }

    pub fn grant_resource(&mut self, resource: &str, amount: f64) {
        let before = *self.resources.get(resource).unwrap_or(&0.0);
        self.resources.insert(resource.to_string(), before + amount);
    }

    pub fn resource_floor(&self, resource: &str) -> f64 {
        *self.resource_floors.get(resource).unwrap_or(&self.debt_floor)
    }

    pub fn next_entity_id(&mut self, entity_type: &str) -> String {
        let counter = self.entity_type_counters.entry(entity_type.to_string()).or_insert(0);
        *counter += 1;
        format!("{entity_type}-{counter}")
    }

    pub fn next_node_id(&mut self, prototype_id: &str) -> String {
        let counter = self.node_counters.entry(prototype_id.to_string()).or_insert(0);
        *counter += 1;
        format!("{prototype_id}-{counter}")
    }

    /// Create a new entity of `entity_type`, open an idle activity segment
    /// for it, and apply the population-provider credit if this type
    /// provides population room.
    pub fn create_entity(&mut self, entity_type: &str) -> String {
        let id = self.next_entity_id(entity_type);
        let entity = EntityInstance::new(id.clone(), entity_type.to_string());
        self.entities.insert(id.clone(), entity);

        let mut timeline = EntityTimeline::default();
        timeline.switch(
            self.now,
            crate::public::result::ActivityKind::Idle,
            "",
            true,
            &mut self.event_log,
            &id,
        );
        self.entity_timelines.insert(id.clone(), timeline);

        if let Some(pop) = self.population.clone() {
            if let Some(rate) = pop.provided_by_entity_type.get(entity_type) {
                self.grant_resource(&pop.resource, *rate);
            }
        }

        if let Some(rule) = self.spawn_gather_rules.get(entity_type).cloned() {
            crate::internal::scheduler::assign_gather_for_spawn(self, &id, &rule);
        }

        id
    }

    /// Create a new resource-node instance from `prototype_id`.
    pub fn create_node(&mut self, prototype_id: &str) -> anyhow::Result<String> {
        let proto = self
            .node_prototypes
            .get(prototype_id)
            .ok_or_else(|| anyhow::anyhow!("unknown resource-node prototype: {prototype_id}"))?
            .clone();
        let id = self.next_node_id(prototype_id);

        let decay_start = proto.decay_start;
        let mut node = ResourceNodeInstance {
            id: id.clone(),
            prototype_id: prototype_id.to_string(),
            produces: proto.produces.clone(),
            rate_by_entity_type: proto.rate_by_entity_type.clone(),
            max_workers: proto.max_workers,
            remaining_stock: proto.stock,
            decay_rate_per_second: proto.decay_rate_per_second,
            decay_start,
            decay_active: false,
            depleted: false,
            tags: proto.tags.clone(),
        };

        if matches!(decay_start, Some(crate::public::catalogue::DecayStart::OnSpawn)) {
            node.decay_active = true;
        }

        if let Some(stock) = node.remaining_stock {
            let keys = {
                let mut ks = vec![crate::internal::modifiers::key_gather_stock_node(prototype_id)];
                ks.extend(node.tags.iter().map(|t| crate::internal::modifiers::key_gather_stock_tag(t)));
                ks
            };
            node.remaining_stock = Some(crate::internal::modifiers::apply_modifiers(stock, &keys, &self.modifiers).max(0.0));
        }

        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    pub fn switch_entity_activity(&mut self, entity_id: &str, kind: crate::public::result::ActivityKind, detail: &str, force_split: bool) {
        let now = self.now;
        if let Some(timeline) = self.entity_timelines.get_mut(entity_id) {
            timeline.switch(now, kind, detail, force_split, &mut self.event_log, entity_id);
        }
    }

    pub fn record_command_result(&mut self, source_command_index: usize, outcome: crate::public::result::CommandResultOutcome) {
        self.command_results.push(CommandResult {
            source_command_index,
            outcome,
        });
    }
}
