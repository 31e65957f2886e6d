//! The continuous-time gathering economy.
//!
//! Resources accrue continuously between discrete events rather than in
//! fixed ticks; [`advance_economy`] integrates every entity's current
//! gather rate across `[now, to)` in one step, the way the driver already
//! quantizes every other time value onto the tick grid (see
//! `internal::clock`).

use crate::internal::modifiers::{apply_modifiers, key_gather_rate_entity, key_gather_rate_node, key_gather_rate_tag};
use crate::internal::state::SimState;
use crate::public::catalogue::DecayStart;
use crate::public::result::ActivityKind;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct EconomySnapshot {
    /// Net accrual rate per resource, summed over every gathering entity.
    pub gather_rates: HashMap<String, f64>,
    /// Depletion-relevant rate per node (workers only; decay is added on
    /// top when projecting/decrementing stock).
    pub node_rates: HashMap<String, f64>,
}

/// Flip a node's decay into its active state the moment its first worker
/// starts gathering from it.
pub fn activate_decay_on_gather(state: &mut SimState) {
    let gathering_nodes: Vec<String> = state
        .entities
        .values()
        .filter_map(|e| e.resource_node_id.clone())
        .collect();
    for node_id in gathering_nodes {
        if let Some(node) = state.nodes.get_mut(&node_id) {
            if !node.decay_active && node.decay_start == Some(DecayStart::OnFirstGather) {
                node.decay_active = true;
            }
        }
    }
}

/// Compute the current gather-rate snapshot: for every entity assigned to
/// a resource node, its per-second rate is the node's base rate for that
/// entity's type, with `gather.rate.node.{proto}`, then
/// `gather.rate.entity.{type}`, then `gather.rate.tag.{tag}` modifiers
/// applied in that order.
pub fn compute_snapshot(state: &SimState) -> EconomySnapshot {
    let mut snapshot = EconomySnapshot::default();

    for entity in state.entities.values() {
        let Some(node_id) = &entity.resource_node_id else { continue };
        if crate::internal::clock::time_gt(entity.busy_until, state.now) {
            continue;
        }
        let Some(node) = state.nodes.get(node_id) else { continue };
        if node.depleted {
            continue;
        }

        let base = node.base_rate_for(&entity.entity_type);
        let mut keys = vec![key_gather_rate_node(&node.prototype_id), key_gather_rate_entity(&entity.entity_type)];
        keys.extend(node.tags.iter().map(|t| key_gather_rate_tag(t)));
        let rate = apply_modifiers(base, &keys, &state.modifiers);

        *snapshot.gather_rates.entry(node.produces.clone()).or_insert(0.0) += rate;
        *snapshot.node_rates.entry(node_id.clone()).or_insert(0.0) += rate;
    }

    snapshot
}

fn total_drain_rate(state: &SimState, node_id: &str, snapshot: &EconomySnapshot) -> f64 {
    let worker_rate = snapshot.node_rates.get(node_id).copied().unwrap_or(0.0);
    let node = &state.nodes[node_id];
    let decay_rate = if node.decay_active { node.decay_rate_per_second.unwrap_or(0.0) } else { 0.0 };
    worker_rate + decay_rate
}

/// The next tick at which some finite-stock node would run dry if nothing
/// else changes first, used by the driver to clamp how far it advances
/// before re-evaluating.
pub fn next_depletion_time(state: &SimState, snapshot: &EconomySnapshot) -> Option<f64> {
    state
        .nodes
        .values()
        .filter(|n| !n.depleted)
        .filter_map(|n| {
            let stock = n.remaining_stock?;
            let rate = total_drain_rate(state, &n.id, snapshot);
            if rate <= 0.0 {
                return None;
            }
            Some(crate::internal::clock::to_future_tick(state.now + stock / rate))
        })
        .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.min(t))))
}

/// Unassign every entity gathering from `node_id` back to idle. Called once
/// a node is marked depleted. Returns the worker list the depletion event
/// fired with (empty for a decay-only depletion with no active gatherers).
fn unassign_workers(state: &mut SimState, node_id: &str) -> Vec<String> {
    let workers: Vec<String> = state
        .entities
        .values()
        .filter(|e| e.resource_node_id.as_deref() == Some(node_id))
        .map(|e| e.id.clone())
        .collect();
    for worker_id in &workers {
        if let Some(entity) = state.entities.get_mut(worker_id) {
            entity.resource_node_id = None;
        }
        state.switch_entity_activity(worker_id, ActivityKind::Idle, "", false);
    }
    workers
}

/// Integrate the economy across `[state.now, to)`: push one resource
/// timeline row, accrue resources at the current snapshot's rates,
/// decrement node stock (workers plus active decay), and mark any node
/// that reaches zero as depleted, unassigning its workers. `to` must
/// already be clamped to the next boundary -- this function
/// does not discover new boundaries partway through the interval.
pub fn advance_economy(state: &mut SimState, to: f64) {
    let from = state.now;
    if crate::internal::clock::time_eq(from, to) {
        return;
    }
    let dt = to - from;

    activate_decay_on_gather(state);
    let snapshot = compute_snapshot(state);

    state.resource_timeline.push(crate::public::result::ResourceTimelineRow {
        start: from,
        end: to,
        start_resources: state.resources.clone(),
        gather_rates: snapshot.gather_rates.clone(),
    });

    for (resource, rate) in &snapshot.gather_rates {
        state.grant_resource(resource, rate * dt);
    }

    let node_ids: Vec<String> = state.nodes.keys().cloned().collect();
    for node_id in node_ids {
        let (remaining_stock, depleted) = {
            let node = &state.nodes[&node_id];
            (node.remaining_stock, node.depleted)
        };
        let Some(stock) = remaining_stock else { continue };
        if depleted {
            continue;
        }
        let rate = total_drain_rate(state, &node_id, &snapshot);
        if rate <= 0.0 {
            continue;
        }
        let drained = rate * dt;
        if drained + crate::internal::clock::EPS >= stock {
            let node = state.nodes.get_mut(&node_id).unwrap();
            node.remaining_stock = Some(0.0);
            node.depleted = true;
            state.node_depletion_times.entry(node_id.clone()).or_default().push(to);
            let actors = unassign_workers(state, &node_id);
            state.depletion_events.push(crate::internal::state::DepletionEvent {
                node_id: node_id.clone(),
                time: to,
                actors,
            });
        } else {
            let node = state.nodes.get_mut(&node_id).unwrap();
            node.remaining_stock = Some(stock - drained);
        }
    }

    state.now = to;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::node::ResourceNodeInstance;
    use crate::public::catalogue::GameCatalogue;
    use std::collections::HashMap as Map;

    fn empty_catalogue() -> GameCatalogue {
        GameCatalogue {
            resources: vec![],
            starting_resources: Default::default(),
            starting_entities: vec![],
            entities: Default::default(),
            resource_node_prototypes: Default::default(),
            starting_resource_nodes: vec![],
            starting_modifiers: vec![],
            task_efficiency: Default::default(),
            population: None,
            actions: Default::default(),
            market: None,
        }
    }

    fn sheep_node() -> ResourceNodeInstance {
        let mut rate_by_entity_type = Map::new();
        rate_by_entity_type.insert("villager".to_string(), 0.5);
        ResourceNodeInstance {
            id: "sheep-1".into(),
            prototype_id: "sheep".into(),
            produces: "food".into(),
            rate_by_entity_type,
            max_workers: Some(1),
            remaining_stock: Some(100.0),
            decay_rate_per_second: None,
            decay_start: None,
            decay_active: false,
            depleted: false,
            tags: vec![],
        }
    }

    #[test]
    fn accrues_resources_over_the_interval() {
        let mut state = SimState::new(&empty_catalogue(), -30.0, false);
        state.nodes.insert("sheep-1".into(), sheep_node());
        let villager = state.create_entity("villager");
        state.entities.get_mut(&villager).unwrap().resource_node_id = Some("sheep-1".into());

        advance_economy(&mut state, 10.0);

        assert_eq!(*state.resources.get("food").unwrap(), 5.0);
        assert_eq!(state.nodes["sheep-1"].remaining_stock, Some(95.0));
    }

    #[test]
    fn depletes_node_and_unassigns_worker() {
        let mut state = SimState::new(&empty_catalogue(), -30.0, false);
        let mut node = sheep_node();
        node.remaining_stock = Some(5.0);
        state.nodes.insert("sheep-1".into(), node);
        let villager = state.create_entity("villager");
        state.entities.get_mut(&villager).unwrap().resource_node_id = Some("sheep-1".into());

        advance_economy(&mut state, 10.0);

        assert!(state.nodes["sheep-1"].depleted);
        assert_eq!(state.entities[&villager].resource_node_id, None);
        assert_eq!(state.node_depletion_times["sheep-1"], vec![10.0]);
    }
}
