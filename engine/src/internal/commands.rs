//! Command dispatch: executing one already-due [`Command`] against the
//! world state. This is the single place the
//! driver, the deferred-command processor, and the trigger engine all
//! funnel through, so `after ...`/trigger-nested commands run exactly the
//! same code path as a top-level command reaching its `at` time.

use crate::internal::natural_sort;
use crate::internal::scheduler::{self, ScheduleOutcome};
use crate::internal::selector::resolve_node_set_sorted;
use crate::internal::state::{AutoQueueKey, AutoQueueRule, QueueRule, SimState, SpawnGatherRule, TriggerEventContext, TriggerRule};
use crate::public::program::{Command, TriggerCondition, TriggerMode};
use crate::public::result::{CommandResultOutcome, ViolationCode};

/// Whether `condition` has already matched at least once in `state`'s
/// click/completion/depletion history -- consulted when registering a
/// `mode: once` `onTrigger` rule, since a `once` rule armed after its
/// condition already fired will never run.
fn condition_already_matched(state: &SimState, condition: &TriggerCondition) -> bool {
    match condition {
        TriggerCondition::Clicked { action_id } => state.click_events.iter().any(|e| &e.action_id == action_id),
        TriggerCondition::Completed { action_id } => state.completion_events.iter().any(|e| &e.action_id == action_id),
        TriggerCondition::Depleted { selector } => {
            let ids = resolve_node_set_sorted(state, &[], &[selector.clone()]);
            state.depletion_events.iter().any(|e| ids.contains(&e.node_id))
        }
        TriggerCondition::Exhausted { selector } => {
            let ids = resolve_node_set_sorted(state, &[], &[selector.clone()]);
            !ids.is_empty() && ids.iter().all(|id| state.depletion_events.iter().any(|e| &e.node_id == id))
        }
    }
}

/// Execute `command`, which has already reached its scheduled time. Not
/// every variant produces an immediate effect: `queueAction`/`autoQueue`
/// register state that later pump passes (see `internal::scheduler`)
/// drive forward. `ctx` carries the firing trigger event's actor/created-node
/// context when `command` is a trigger's nested command; `None` for a
/// top-level command reaching its own `at` time.
pub fn execute_command(state: &mut SimState, command: &Command, source_command_index: usize, ctx: Option<&TriggerEventContext>) {
    match command {
        Command::QueueAction(c) => {
            let filter_ids = c.actors.actor_resource_node_ids.clone().unwrap_or_default();
            let filter_selectors = c.actors.actor_resource_node_selectors.clone().unwrap_or_default();
            let rule = QueueRule {
                source_command_index,
                action_id: c.action_id.clone(),
                total_iterations: c.count,
                completed_iterations: 0,
                actor_selectors: c.actors.actor_selectors.clone(),
                actor_resource_node_ids: filter_ids,
                actor_resource_node_selectors: filter_selectors,
                next_attempt_at: state.now,
                delay_until: state.now,
                requested_at: state.now,
                last_blocked_reason: None,
                first_blocked_message: None,
                blocked_since: None,
            };
            state.queue_rules.push(rule);
        }

        Command::AssignGather(c) => {
            let actor_ids = c.actors.actor_resource_node_ids.clone().unwrap_or_default();
            let actor_selectors = c.actors.actor_resource_node_selectors.clone().unwrap_or_default();
            let node_ids = c.nodes.resource_node_ids.clone().unwrap_or_default();
            let node_selectors = c.nodes.resource_node_selectors.clone().unwrap_or_default();
            let result = scheduler::assign_gather(
                state,
                &c.actor_type,
                c.all,
                c.count,
                c.actors.actor_selectors.as_deref(),
                &actor_ids,
                &actor_selectors,
                &node_ids,
                &node_selectors,
                c.allow_empty_selector_match,
            );
            match result {
                Ok(assigned) => state.record_command_result(
                    source_command_index,
                    CommandResultOutcome::Scheduled {
                        completion_time: state.now,
                        action_id: "assignGather".to_string(),
                        actors: assigned,
                        started_at: state.now,
                    },
                ),
                Err((code, message)) => {
                    state.warn(code, message.clone());
                    state.record_command_result(source_command_index, CommandResultOutcome::Failed { message });
                }
            }
        }

        Command::AssignEventGather(c) => {
            let node_ids = c.nodes.resource_node_ids.clone().unwrap_or_default();
            let node_selectors = c.nodes.resource_node_selectors.clone().unwrap_or_default();
            let empty_ctx = TriggerEventContext {
                actors: Vec::new(),
                created_node_ids: Vec::new(),
                mode: TriggerMode::Every,
            };
            let ctx = ctx.unwrap_or(&empty_ctx);
            match scheduler::assign_event_gather(state, &node_ids, &node_selectors, ctx) {
                Ok(assigned) => state.record_command_result(
                    source_command_index,
                    CommandResultOutcome::Scheduled {
                        completion_time: state.now,
                        action_id: "assignEventGather".to_string(),
                        actors: assigned,
                        started_at: state.now,
                    },
                ),
                Err((code, message)) => {
                    state.warn(code, message.clone());
                    state.record_command_result(source_command_index, CommandResultOutcome::Failed { message });
                }
            }
        }

        Command::AutoQueue(c) => {
            let key = AutoQueueKey {
                action_id: c.action_id.clone(),
                actor_selectors: c.actors.actor_selectors.clone(),
                actor_resource_node_ids: c.actors.actor_resource_node_ids.clone().unwrap_or_default(),
                actor_resource_node_selectors: c.actors.actor_resource_node_selectors.clone().unwrap_or_default(),
            };
            state.auto_queue_rules.retain(|r| r.key != key);
            state.auto_queue_rules.push(AutoQueueRule {
                key,
                next_attempt_at: state.now,
                delay_until: state.now,
            });
            record_immediate(state, source_command_index, "autoQueue");
        }

        Command::StopAutoQueue(c) => {
            let key = AutoQueueKey {
                action_id: c.action_id.clone(),
                actor_selectors: c.actors.actor_selectors.clone(),
                actor_resource_node_ids: c.actors.actor_resource_node_ids.clone().unwrap_or_default(),
                actor_resource_node_selectors: c.actors.actor_resource_node_selectors.clone().unwrap_or_default(),
            };
            state.auto_queue_rules.retain(|r| r.key != key);
            record_immediate(state, source_command_index, "stopAutoQueue");
        }

        Command::SetSpawnGather(c) => {
            state.spawn_gather_rules.insert(
                c.entity_type.clone(),
                SpawnGatherRule {
                    resource_node_ids: c.nodes.resource_node_ids.clone().unwrap_or_default(),
                    resource_node_selectors: c.nodes.resource_node_selectors.clone().unwrap_or_default(),
                },
            );
            record_immediate(state, source_command_index, "setSpawnGather");
        }

        Command::GrantResources(c) => {
            for (resource, amount) in &c.resources {
                if *amount >= 0.0 {
                    state.grant_resource(resource, *amount);
                } else {
                    state.charge_resource(resource, -amount);
                }
            }
            record_immediate(state, source_command_index, "grantResources");
        }

        Command::SpawnEntities(c) => {
            for _ in 0..c.count {
                state.create_entity(&c.entity_type);
            }
            let _ = (&c.nodes.resource_node_ids, &c.nodes.resource_node_selectors);
            record_immediate(state, source_command_index, "spawnEntities");
        }

        Command::ConsumeResourceNodes(c) => {
            let targets = resolve_node_set_sorted(state, &[], &[format!("proto:{}", c.prototype_id)]);
            let mut removed = 0;
            for id in targets {
                if removed >= c.count {
                    break;
                }
                state.nodes.remove(&id);
                removed += 1;
            }
            if removed < c.count {
                let message = format!("consumeResourceNodes could not remove {} of {}", c.count, c.prototype_id);
                state.warn(ViolationCode::NoResource, message.clone());
                state.record_command_result(source_command_index, CommandResultOutcome::Failed { message });
            } else {
                record_immediate(state, source_command_index, "consumeResourceNodes");
            }
        }

        Command::CreateResourceNodes(c) => {
            let mut failed = None;
            for _ in 0..c.count {
                if let Err(err) = state.create_node(&c.prototype_id) {
                    state.warn(ViolationCode::NoResource, err.to_string());
                    failed = Some(err.to_string());
                    break;
                }
            }
            match failed {
                Some(message) => state.record_command_result(source_command_index, CommandResultOutcome::Failed { message }),
                None => record_immediate(state, source_command_index, "createResourceNodes"),
            }
        }

        Command::AddModifier(c) => {
            state.modifiers.push(c.modifier.clone());
            record_immediate(state, source_command_index, "addModifier");
        }

        Command::TradeResources(c) => {
            crate::internal::market::trade_resources(state, &c.sell, &c.buy, c.amount, source_command_index);
        }

        Command::OnTrigger(c) => {
            if c.trigger_mode == TriggerMode::Once && condition_already_matched(state, &c.trigger) {
                state.warn(
                    ViolationCode::AmbiguousTrigger,
                    format!("onTrigger ({:?}, once) registered after its condition already matched", c.trigger),
                );
            }
            state.trigger_rules.push(TriggerRule {
                condition: c.trigger.clone(),
                mode: c.trigger_mode,
                inner_command: (*c.command).clone(),
                source_command_index,
                has_fired: false,
            });
            record_immediate(state, source_command_index, "onTrigger");
        }
    }
}

/// Record a generic "ran immediately, no actors involved" result for a
/// command variant that isn't itself an action schedule attempt.
fn record_immediate(state: &mut SimState, source_command_index: usize, action_id: &str) {
    state.record_command_result(
        source_command_index,
        CommandResultOutcome::Scheduled {
            completion_time: state.now,
            action_id: action_id.to_string(),
            actors: vec![],
            started_at: state.now,
        },
    );
}

/// After `try_schedule_action_now` succeeds for a `queueAction`-sourced
/// attempt, record the command result and bump the action's click-time
/// bookkeeping already done inside the scheduler itself.
pub fn record_schedule_outcome(state: &mut SimState, source_command_index: usize, outcome: &ScheduleOutcome) {
    match outcome {
        ScheduleOutcome::Scheduled {
            completion_time,
            actors,
            started_at,
        } => {
            state.record_command_result(
                source_command_index,
                CommandResultOutcome::Scheduled {
                    completion_time: *completion_time,
                    action_id: String::new(),
                    actors: actors.clone(),
                    started_at: *started_at,
                },
            );
        }
        ScheduleOutcome::Blocked { code, message } => {
            state.warn(*code, message.clone());
            state.record_command_result(source_command_index, CommandResultOutcome::Failed { message: message.clone() });
        }
    }
}

/// Whether a command must wait for an entity to exist before it can run
///: an explicit `afterEntityId`, or an actor selector that
/// names an ID-shaped entity which does not exist yet.
pub fn implicit_wait_target(state: &SimState, command: &Command) -> Option<String> {
    let explicit = match command {
        Command::QueueAction(c) => c.after_entity_id.clone(),
        Command::AssignGather(c) => c.after_entity_id.clone(),
        Command::AssignEventGather(c) => c.after_entity_id.clone(),
        _ => None,
    };
    if explicit.is_some() {
        return explicit;
    }

    let selectors = match command {
        Command::QueueAction(c) => c.actors.actor_selectors.as_deref(),
        Command::AssignGather(c) => c.actors.actor_selectors.as_deref(),
        _ => None,
    }?;
    selectors
        .iter()
        .find(|s| natural_sort::is_id_shaped(s) && !state.entities.contains_key(*s))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::public::catalogue::GameCatalogue;
    use crate::public::program::{ActorSpec, AutoQueueCommand, StopAutoQueueCommand};
    use std::collections::HashMap;

    fn empty_catalogue() -> GameCatalogue {
        GameCatalogue {
            resources: vec![],
            starting_resources: HashMap::new(),
            starting_entities: vec![],
            entities: HashMap::new(),
            resource_node_prototypes: HashMap::new(),
            starting_resource_nodes: vec![],
            starting_modifiers: vec![],
            task_efficiency: Default::default(),
            population: None,
            actions: HashMap::new(),
            market: None,
        }
    }

    #[test]
    fn registering_the_same_auto_queue_key_twice_is_idempotent() {
        let catalogue = empty_catalogue();
        let mut state = SimState::new(&catalogue, -30.0, false);
        let command = Command::AutoQueue(AutoQueueCommand {
            at: Some(0.0),
            action_id: "train_villager".into(),
            actors: ActorSpec::default(),
        });

        execute_command(&mut state, &command, 0, None);
        execute_command(&mut state, &command, 1, None);
        execute_command(&mut state, &command, 2, None);

        assert_eq!(state.auto_queue_rules.len(), 1);
    }

    #[test]
    fn stop_auto_queue_removes_every_matching_rule_at_once() {
        let catalogue = empty_catalogue();
        let mut state = SimState::new(&catalogue, -30.0, false);
        let register = Command::AutoQueue(AutoQueueCommand {
            at: Some(0.0),
            action_id: "train_villager".into(),
            actors: ActorSpec::default(),
        });
        execute_command(&mut state, &register, 0, None);
        execute_command(&mut state, &register, 1, None);
        assert_eq!(state.auto_queue_rules.len(), 1);

        let stop = Command::StopAutoQueue(StopAutoQueueCommand {
            at: Some(0.0),
            action_id: "train_villager".into(),
            actors: ActorSpec::default(),
        });
        execute_command(&mut state, &stop, 2, None);

        assert!(state.auto_queue_rules.is_empty());
    }

    #[test]
    fn registering_a_once_trigger_after_its_condition_already_matched_warns() {
        use crate::public::program::{GrantResourcesCommand, OnTriggerCommand, TriggerCondition, TriggerMode};

        let catalogue = empty_catalogue();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.click_events.push(crate::internal::state::ClickEvent {
            action_id: "train_villager".into(),
            time: 5.0,
            actors: vec!["town_center-1".into()],
        });

        let command = Command::OnTrigger(OnTriggerCommand {
            at: Some(10.0),
            trigger: TriggerCondition::Clicked {
                action_id: "train_villager".into(),
            },
            trigger_mode: TriggerMode::Once,
            command: Box::new(Command::GrantResources(GrantResourcesCommand {
                at: None,
                resources: [("wood".to_string(), 10.0)].into_iter().collect(),
            })),
        });

        execute_command(&mut state, &command, 0, None);

        assert_eq!(state.violations.len(), 1);
        assert_eq!(state.violations[0].code, ViolationCode::AmbiguousTrigger);
        assert_eq!(state.trigger_rules.len(), 1);
    }

    #[test]
    fn registering_an_every_trigger_after_a_past_match_does_not_warn() {
        use crate::public::program::{GrantResourcesCommand, OnTriggerCommand, TriggerCondition, TriggerMode};

        let catalogue = empty_catalogue();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.click_events.push(crate::internal::state::ClickEvent {
            action_id: "train_villager".into(),
            time: 5.0,
            actors: vec!["town_center-1".into()],
        });

        let command = Command::OnTrigger(OnTriggerCommand {
            at: Some(10.0),
            trigger: TriggerCondition::Clicked {
                action_id: "train_villager".into(),
            },
            trigger_mode: TriggerMode::Every,
            command: Box::new(Command::GrantResources(GrantResourcesCommand {
                at: None,
                resources: [("wood".to_string(), 10.0)].into_iter().collect(),
            })),
        });

        execute_command(&mut state, &command, 0, None);

        assert!(state.violations.is_empty());
    }
}
