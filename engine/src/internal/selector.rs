//! The selector grammar and the node
//! resolver.

use crate::internal::natural_sort;
use crate::internal::state::SimState;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    /// `id:created` -- the pseudo-selector only meaningful inside a
    /// trigger's `assignEventGather`, resolving to the resource nodes the
    /// firing event's completion created. Matches no node structurally;
    /// see `resolve_node_set_sorted_for_event`.
    IdCreated,
    Proto(String),
    Tag(String),
    Res(String),
    ActorIdle,
}

/// Parse a `kind:value` selector string. A bare token with no `kind:`
/// prefix defaults to `res:` (the common case, e.g. `"food"` in `assign
/// villager to food`), except for the literal alias `"idle"`, which maps
/// to `actor:idle` (see DESIGN.md, "selector aliasing").
pub fn parse_selector(raw: &str) -> Selector {
    match raw.split_once(':') {
        Some(("id", "created")) => Selector::IdCreated,
        Some(("id", v)) => Selector::Id(v.to_string()),
        Some(("proto", v)) => Selector::Proto(v.to_string()),
        Some(("tag", v)) => Selector::Tag(v.to_string()),
        Some(("res", v)) => Selector::Res(v.to_string()),
        Some(("actor", "idle")) => Selector::ActorIdle,
        Some((_, _)) => Selector::Res(raw.to_string()),
        None if raw == "idle" => Selector::ActorIdle,
        None => Selector::Res(raw.to_string()),
    }
}

pub fn node_matches_selector(node: &crate::internal::node::ResourceNodeInstance, sel: &Selector) -> bool {
    match sel {
        Selector::Id(id) => &node.id == id,
        Selector::IdCreated => false,
        Selector::Proto(p) => &node.prototype_id == p,
        Selector::Tag(t) => node.tags.iter().any(|x| x == t),
        Selector::Res(r) => &node.produces == r,
        Selector::ActorIdle => false,
    }
}

/// Resolve a node ID list + selector list to a deduplicated set of node
/// IDs, preserving first-appearance priority order: explicit IDs first (in
/// the order given), then each selector's natural-sorted matches, in the
/// order the selectors were given.
pub fn resolve_node_set(state: &SimState, ids: &[String], selectors: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for id in ids {
        if state.nodes.contains_key(id) && seen.insert(id.clone()) {
            out.push(id.clone());
        }
    }
    for raw in selectors {
        let parsed = parse_selector(raw);
        let mut matches: Vec<String> = state
            .nodes
            .values()
            .filter(|n| node_matches_selector(n, &parsed))
            .map(|n| n.id.clone())
            .collect();
        matches.sort_by(|a, b| natural_sort::cmp(a, b));
        for m in matches {
            if seen.insert(m.clone()) {
                out.push(m);
            }
        }
    }
    out
}

/// Same as [`resolve_node_set`], but re-sorted into plain natural-sort
/// order rather than first-appearance priority (e.g. `consumesResourceNodes`,
/// gather assignment targets).
pub fn resolve_node_set_sorted(state: &SimState, ids: &[String], selectors: &[String]) -> Vec<String> {
    let mut out = resolve_node_set(state, ids, selectors);
    out.sort_by(|a, b| natural_sort::cmp(a, b));
    out
}

/// Same as [`resolve_node_set_sorted`], but also resolves any `id:created`
/// selector against `created_node_ids` -- the resource nodes the firing
/// trigger event's completion created, only meaningful for
/// `assignEventGather`.
pub fn resolve_node_set_sorted_for_event(state: &SimState, ids: &[String], selectors: &[String], created_node_ids: &[String]) -> Vec<String> {
    let mut out = resolve_node_set(state, ids, selectors);
    let mut seen: HashSet<String> = out.iter().cloned().collect();
    for raw in selectors {
        if matches!(parse_selector(raw), Selector::IdCreated) {
            for id in created_node_ids {
                if state.nodes.contains_key(id) && seen.insert(id.clone()) {
                    out.push(id.clone());
                }
            }
        }
    }
    out.sort_by(|a, b| natural_sort::cmp(a, b));
    out
}

/// The resolved actor-node filter: an (optionally empty) set of allowed
/// node IDs in priority order, plus whether unassigned ("idle") entities
/// are allowed through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActorNodeFilter {
    pub node_ids: Vec<String>,
    pub allow_idle: bool,
}

impl ActorNodeFilter {
    /// The filter priority of an entity currently on `node_id` (or `None`
    /// if idle): its rank in `node_ids`, or the slot just after every named
    /// node if it is idle and idle is allowed, or "doesn't match" otherwise.
    pub fn priority_of(&self, node_id: Option<&str>) -> usize {
        match node_id {
            Some(nid) => self.node_ids.iter().position(|x| x == nid).unwrap_or(usize::MAX),
            None => {
                if self.allow_idle {
                    self.node_ids.len()
                } else {
                    usize::MAX
                }
            }
        }
    }

    pub fn allows(&self, node_id: Option<&str>) -> bool {
        self.priority_of(node_id) != usize::MAX
    }
}

/// Resolve `actorResourceNodeIds`/`actorResourceNodeSelectors` into a
/// filter. Returns `None` if both are empty/absent, meaning "no filter
/// supplied".
pub fn resolve_actor_node_filter(state: &SimState, ids: &[String], selectors: &[String]) -> Option<ActorNodeFilter> {
    if ids.is_empty() && selectors.is_empty() {
        return None;
    }
    let mut allow_idle = false;
    let mut node_ids = Vec::new();
    let mut seen = HashSet::new();
    for id in ids {
        if state.nodes.contains_key(id) && seen.insert(id.clone()) {
            node_ids.push(id.clone());
        }
    }
    for raw in selectors {
        match parse_selector(raw) {
            Selector::ActorIdle => allow_idle = true,
            parsed => {
                let mut matches: Vec<String> = state
                    .nodes
                    .values()
                    .filter(|n| node_matches_selector(n, &parsed))
                    .map(|n| n.id.clone())
                    .collect();
                matches.sort_by(|a, b| natural_sort::cmp(a, b));
                for m in matches {
                    if seen.insert(m.clone()) {
                        node_ids.push(m);
                    }
                }
            }
        }
    }
    Some(ActorNodeFilter { node_ids, allow_idle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_token_is_res_selector() {
        assert_eq!(parse_selector("food"), Selector::Res("food".into()));
    }

    #[test]
    fn idle_alias() {
        assert_eq!(parse_selector("idle"), Selector::ActorIdle);
        assert_eq!(parse_selector("actor:idle"), Selector::ActorIdle);
    }

    #[test]
    fn kind_prefixes() {
        assert_eq!(parse_selector("id:sheep-1"), Selector::Id("sheep-1".into()));
        assert_eq!(parse_selector("proto:sheep"), Selector::Proto("sheep".into()));
        assert_eq!(parse_selector("tag:forest"), Selector::Tag("forest".into()));
        assert_eq!(parse_selector("res:wood"), Selector::Res("wood".into()));
    }

    #[test]
    fn id_created_is_its_own_selector_not_a_literal_id() {
        assert_eq!(parse_selector("id:created"), Selector::IdCreated);
        assert_ne!(parse_selector("id:created"), Selector::Id("created".into()));
    }
}
