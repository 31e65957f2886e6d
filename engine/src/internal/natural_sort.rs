//! Natural-sort ordering for entity and node IDs (`{prefix}-{ordinal}`).
//!
//! Plain lexicographic order would sort `"villager-10"` before
//! `"villager-9"`. Every deterministic tie-break in the engine goes
//! through [`cmp`] instead.

use std::cmp::Ordering;

/// Split an ID into its `(prefix, ordinal)` parts if it matches
/// `{prefix}-{digits}`, where `prefix` is non-empty.
fn split(id: &str) -> Option<(&str, u64)> {
    let dash = id.rfind('-')?;
    let (prefix, rest) = (&id[..dash], &id[dash + 1..]);
    if prefix.is_empty() || rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u64>().ok().map(|n| (prefix, n))
}

/// Compare two IDs: by prefix lexicographically, then by ordinal
/// numerically. Falls back to plain string comparison when either ID
/// doesn't match the `{prefix}-{ordinal}` shape.
pub fn cmp(a: &str, b: &str) -> Ordering {
    match (split(a), split(b)) {
        (Some((pa, na)), Some((pb, nb))) => pa.cmp(pb).then_with(|| na.cmp(&nb)),
        _ => a.cmp(b),
    }
}

/// `true` if `id` matches the `{prefix}-{ordinal}` shape used by entity and
/// node instance IDs (and so can be treated as an exact-ID selector rather
/// than a type/prototype name).
pub fn is_id_shaped(id: &str) -> bool {
    split(id).is_some()
}
