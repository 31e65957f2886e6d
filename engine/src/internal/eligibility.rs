//! Actor resolution and eligibility ranking.

use crate::internal::natural_sort;
use crate::internal::selector::ActorNodeFilter;
use crate::internal::state::SimState;
use crate::public::result::ViolationCode;
use std::collections::HashSet;

pub enum ActorResolution {
    Ok(Vec<String>),
    /// No entity of the required type(s) exists at all.
    NoActors,
    /// Entities of the required type exist, but not enough are eligible
    /// right now (busy, on the wrong node, or already claimed by an
    /// earlier selector in the same pick).
    NoUnitAvailable,
}

impl ActorResolution {
    pub fn violation_code(&self) -> Option<ViolationCode> {
        match self {
            ActorResolution::Ok(_) => None,
            ActorResolution::NoActors => Some(ViolationCode::NoActors),
            ActorResolution::NoUnitAvailable => Some(ViolationCode::NoUnitAvailable),
        }
    }
}

/// An entity is eligible if it is one of `actor_types`; if `idle_only`, it
/// must also not be mid-action (`busy_until <= now+ε`); and, when `filter`
/// is present, it must currently sit on an allowed resource node (or be
/// idle, with `actor:idle` allowed).
pub fn is_eligible(state: &SimState, entity_id: &str, actor_types: &[String], idle_only: bool, filter: Option<&ActorNodeFilter>) -> bool {
    let Some(entity) = state.entities.get(entity_id) else {
        return false;
    };
    if !actor_types.iter().any(|t| t == &entity.entity_type) {
        return false;
    }
    if idle_only && crate::internal::clock::time_gt(entity.busy_until, state.now) {
        return false;
    }
    match filter {
        Some(f) => f.allows(entity.resource_node_id.as_deref()),
        None => true,
    }
}

fn rank_key<'s>(state: &'s SimState, entity_id: &'s str, filter: Option<&ActorNodeFilter>) -> (usize, f64, &'s str) {
    let entity = &state.entities[entity_id];
    let priority = filter.map(|f| f.priority_of(entity.resource_node_id.as_deref())).unwrap_or(0);
    (priority, entity.busy_until, entity.id.as_str())
}

/// Rank entities by `(node-filter priority, busy_until ascending,
/// natural-sort id)` -- the order the engine walks when picking actors
/// automatically.
pub fn rank_entities(state: &SimState, entity_ids: &[String], filter: Option<&ActorNodeFilter>) -> Vec<String> {
    let mut ranked: Vec<String> = entity_ids.to_vec();
    ranked.sort_by(|a, b| {
        let (pa, ba, ida) = rank_key(state, a, filter);
        let (pb, bb, idb) = rank_key(state, b, filter);
        pa.cmp(&pb)
            .then(ba.partial_cmp(&bb).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| natural_sort::cmp(ida, idb))
    });
    ranked
}

/// Resolve the actors for one action/gather pick.
///
/// With no `actor_selectors`, picks the `actor_count` highest-ranked
/// eligible entities automatically. With `actor_selectors`, each entry is
/// resolved in order: an ID-shaped token must name an existing, still-eligible,
/// not-yet-claimed entity; any other token is treated as an entity type and
/// resolves to the first eligible, not-yet-claimed entity of that type. A
/// single failed entry fails the whole pick. `idle_only` excludes entities
/// mid-action (`queueAction`/`autoQueue` pass `true`; `assignGather` passes
/// `false`, since reassigning a gathering entity doesn't require it idle).
pub fn resolve_actors(
    state: &SimState,
    actor_types: &[String],
    actor_count: usize,
    idle_only: bool,
    actor_selectors: Option<&[String]>,
    filter: Option<&ActorNodeFilter>,
) -> ActorResolution {
    match actor_selectors {
        Some(selectors) => resolve_explicit_selectors(state, actor_types, idle_only, selectors, filter),
        None => resolve_automatic(state, actor_types, actor_count, idle_only, filter),
    }
}

fn any_entity_of_types(state: &SimState, actor_types: &[String]) -> bool {
    state.entities.values().any(|e| actor_types.iter().any(|t| t == &e.entity_type))
}

fn resolve_automatic(state: &SimState, actor_types: &[String], actor_count: usize, idle_only: bool, filter: Option<&ActorNodeFilter>) -> ActorResolution {
    if !any_entity_of_types(state, actor_types) {
        return ActorResolution::NoActors;
    }
    let pool: Vec<String> = state
        .entities
        .keys()
        .filter(|id| is_eligible(state, id, actor_types, idle_only, filter))
        .cloned()
        .collect();
    let ranked = rank_entities(state, &pool, filter);
    if ranked.len() < actor_count {
        return ActorResolution::NoUnitAvailable;
    }
    ActorResolution::Ok(ranked.into_iter().take(actor_count).collect())
}

fn resolve_explicit_selectors(state: &SimState, actor_types: &[String], idle_only: bool, selectors: &[String], filter: Option<&ActorNodeFilter>) -> ActorResolution {
    let mut picked = Vec::with_capacity(selectors.len());
    let mut used: HashSet<String> = HashSet::new();

    for raw in selectors {
        if natural_sort::is_id_shaped(raw) {
            if used.contains(raw) || !is_eligible(state, raw, actor_types, idle_only, filter) {
                return ActorResolution::NoUnitAvailable;
            }
            used.insert(raw.clone());
            picked.push(raw.clone());
            continue;
        }

        let pool: Vec<String> = state
            .entities
            .values()
            .filter(|e| &e.entity_type == raw)
            .map(|e| e.id.clone())
            .filter(|id| !used.contains(id) && is_eligible(state, id, actor_types, idle_only, filter))
            .collect();
        if pool.is_empty() {
            if !any_entity_of_types(state, &[raw.clone()]) {
                return ActorResolution::NoActors;
            }
            return ActorResolution::NoUnitAvailable;
        }
        let chosen = rank_entities(state, &pool, filter).remove(0);
        used.insert(chosen.clone());
        picked.push(chosen);
    }

    ActorResolution::Ok(picked)
}

/// The earliest time at which an entity of `actor_types` passing `filter`
/// becomes free, used to compute a queue rule's blocked wake-up time.
/// `None` if no such entity exists at all.
pub fn next_eligible_actor_availability_time(state: &SimState, actor_types: &[String], filter: Option<&ActorNodeFilter>) -> Option<f64> {
    state
        .entities
        .values()
        .filter(|e| actor_types.iter().any(|t| t == &e.entity_type))
        .filter(|e| filter.map(|f| f.allows(e.resource_node_id.as_deref())).unwrap_or(true))
        .map(|e| e.busy_until)
        .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.min(t))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::public::catalogue::GameCatalogue;

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

    fn with_villagers(n: u32) -> SimState {
        let mut state = SimState::new(&empty_catalogue(), -30.0, false);
        for _ in 0..n {
            state.create_entity("villager");
        }
        state
    }

    #[test]
    fn ranks_by_busy_until_then_id() {
        let mut state = with_villagers(3);
        state.entities.get_mut("villager-1").unwrap().busy_until = 10.0;
        state.entities.get_mut("villager-2").unwrap().busy_until = 2.0;
        state.entities.get_mut("villager-3").unwrap().busy_until = 2.0;

        let ids: Vec<String> = state.entities.keys().cloned().collect();
        let ranked = rank_entities(&state, &ids, None);
        assert_eq!(ranked, vec!["villager-2", "villager-3", "villager-1"]);
    }

    #[test]
    fn automatic_resolution_picks_least_busy() {
        let mut state = with_villagers(2);
        state.entities.get_mut("villager-1").unwrap().busy_until = 5.0;

        match resolve_actors(&state, &["villager".to_string()], 1, false, None, None) {
            ActorResolution::Ok(ids) => assert_eq!(ids, vec!["villager-2".to_string()]),
            _ => panic!("expected Ok"),
        }
    }

    #[test]
    fn idle_only_excludes_mid_action_entities() {
        let mut state = with_villagers(1);
        state.entities.get_mut("villager-1").unwrap().busy_until = 5.0;

        match resolve_actors(&state, &["villager".to_string()], 1, true, None, None) {
            ActorResolution::NoUnitAvailable => {}
            _ => panic!("expected NoUnitAvailable for a busy-only pool under idle_only"),
        }
        match resolve_actors(&state, &["villager".to_string()], 1, false, None, None) {
            ActorResolution::Ok(ids) => assert_eq!(ids, vec!["villager-1".to_string()]),
            _ => panic!("expected Ok when idle_only is not required"),
        }
    }

    #[test]
    fn no_actors_when_type_absent() {
        let state = with_villagers(0);
        match resolve_actors(&state, &["villager".to_string()], 1, false, None, None) {
            ActorResolution::NoActors => {}
            _ => panic!("expected NoActors"),
        }
    }

    #[test]
    fn explicit_id_selector_must_exist_and_be_eligible() {
        let state = with_villagers(1);
        match resolve_actors(&state, &["villager".to_string()], 1, false, Some(&["villager-1".to_string()]), None) {
            ActorResolution::Ok(ids) => assert_eq!(ids, vec!["villager-1".to_string()]),
            _ => panic!("expected Ok"),
        }
        match resolve_actors(&state, &["villager".to_string()], 1, false, Some(&["villager-9".to_string()]), None) {
            ActorResolution::NoUnitAvailable => {}
            _ => panic!("expected NoUnitAvailable"),
        }
    }

    #[test]
    fn explicit_type_selector_does_not_reuse_an_entity() {
        let state = with_villagers(1);
        let selectors = vec!["villager".to_string(), "villager".to_string()];
        match resolve_actors(&state, &["villager".to_string()], 2, false, Some(&selectors), None) {
            ActorResolution::NoUnitAvailable => {}
            _ => panic!("expected NoUnitAvailable"),
        }
    }
}
