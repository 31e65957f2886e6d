//! The simulation result and its constituent parts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of violation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    ActionNotFound,
    NoActors,
    NoResource,
    ResourceFull,
    NoUnitAvailable,
    InvalidAssignment,
    AmbiguousTrigger,
    Housed,
    InsufficientResources,
    NegativeResource,
    ResourceStall,
    DelayedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub code: ViolationCode,
    pub time: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CommandResultOutcome {
    Scheduled {
        #[serde(rename = "completionTime")]
        completion_time: f64,
        #[serde(rename = "actionId")]
        action_id: String,
        actors: Vec<String>,
        #[serde(rename = "startedAt")]
        started_at: f64,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(rename = "sourceCommandIndex")]
    pub source_command_index: usize,
    #[serde(flatten)]
    pub outcome: CommandResultOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Idle,
    Gather,
    Action,
}

/// One segment of an entity's activity timeline.
/// Segments never overlap; `end` of segment *n* equals `start` of segment
/// *n+1*, except for the final (possibly still-open) segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySegment {
    pub start: f64,
    pub end: f64,
    pub kind: ActivityKind,
    pub detail: String,
}

/// One half-open `[start, end)` row of the resource timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTimelineRow {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "startResources")]
    pub start_resources: HashMap<String, f64>,
    #[serde(rename = "gatherRates")]
    pub gather_rates: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub time: f64,
    #[serde(rename = "entityId")]
    pub entity_id: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub name: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(rename = "initialResources")]
    pub initial_resources: HashMap<String, f64>,
    #[serde(rename = "resourcesAtEvaluation")]
    pub resources_at_evaluation: HashMap<String, f64>,
    #[serde(rename = "entitiesByType")]
    pub entities_by_type: HashMap<String, u32>,
    #[serde(rename = "totalGathered")]
    pub total_gathered: HashMap<String, f64>,
    #[serde(rename = "avgFloat")]
    pub avg_float: HashMap<String, f64>,
    #[serde(rename = "peakDebt")]
    pub peak_debt: HashMap<String, f64>,
    #[serde(rename = "debtDuration")]
    pub debt_duration: HashMap<String, f64>,
    #[serde(rename = "maxDebt")]
    pub max_debt: HashMap<String, f64>,
    #[serde(rename = "completedActions")]
    pub completed_actions: HashMap<String, u32>,
    pub violations: Vec<Violation>,
    #[serde(rename = "commandResults")]
    pub command_results: Vec<CommandResult>,
    #[serde(rename = "resourceTimeline")]
    pub resource_timeline: Vec<ResourceTimelineRow>,
    #[serde(rename = "entityCountTimeline")]
    pub entity_count_timeline: Vec<(f64, HashMap<String, u32>)>,
    #[serde(rename = "entityTimelines")]
    pub entity_timelines: HashMap<String, Vec<ActivitySegment>>,
    #[serde(rename = "eventLogs")]
    pub event_logs: Option<Vec<EventLogEntry>>,
    pub scores: Vec<Score>,
    #[serde(rename = "actionClickTimes")]
    pub action_click_times: HashMap<String, Vec<f64>>,
    #[serde(rename = "actionCompletionTimes")]
    pub action_completion_times: HashMap<String, Vec<f64>>,
    #[serde(rename = "tcIdleTime")]
    pub tc_idle_time: Option<f64>,
    #[serde(rename = "totalVillagerIdleTime")]
    pub total_villager_idle_time: Option<f64>,
}
