//! Entity instances and their activity timelines.

use crate::public::result::{ActivityKind, ActivitySegment, EventLogEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    pub id: String,
    pub entity_type: String,
    pub busy_until: f64,
    pub resource_node_id: Option<String>,
}

impl EntityInstance {
    pub fn new(id: String, entity_type: String) -> Self {
        EntityInstance {
            id,
            entity_type,
            busy_until: 0.0,
            resource_node_id: None,
        }
    }
}

/// An entity's activity timeline: a list of non-overlapping segments, the
/// last of which may still be open (`end == None` conceptually -- modeled
/// here as "the open segment has no terminal row yet", tracked alongside
/// the closed rows in `EntityTimelines`).
#[derive(Debug, Clone, Default)]
pub struct OpenSegment {
    pub start: f64,
    pub kind: ActivityKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct EntityTimeline {
    pub closed: Vec<ActivitySegment>,
    pub open: Option<OpenSegment>,
}

impl EntityTimeline {
    /// `switchEntityActivity`. Closes the open segment (if any
    /// and non-empty) and opens a new one, unless the entity is already in
    /// the same `(kind, detail)` and `force_split` was not requested.
    pub fn switch(&mut self, now: f64, kind: ActivityKind, detail: &str, force_split: bool, log: &mut Vec<EventLogEntry>, entity_id: &str) {
        use crate::internal::clock::EPS;

        if let Some(open) = &self.open {
            if !force_split && open.kind == kind && open.detail == detail {
                return;
            }
        }

        if let Some(open) = self.open.take() {
            if open.start < now - EPS {
                self.closed.push(ActivitySegment {
                    start: open.start,
                    end: now,
                    kind: open.kind,
                    detail: open.detail,
                });
            }
        }

        self.open = Some(OpenSegment {
            start: now,
            kind,
            detail: detail.to_string(),
        });

        let to = if kind == ActivityKind::Idle {
            "idle".to_string()
        } else {
            format!("{:?}:{}", kind, detail).to_lowercase()
        };
        log.push(EventLogEntry {
            time: now,
            entity_id: entity_id.to_string(),
            to,
        });
    }

    /// Close the final open segment at the evaluation horizon.
    pub fn finalize(&mut self, at: f64) {
        if let Some(open) = self.open.take() {
            if open.start < at - crate::internal::clock::EPS || (at - open.start).abs() < crate::internal::clock::EPS {
                self.closed.push(ActivitySegment {
                    start: open.start,
                    end: at,
                    kind: open.kind,
                    detail: open.detail,
                });
            }
        }
    }

    pub fn current_kind(&self) -> Option<ActivityKind> {
        self.open.as_ref().map(|o| o.kind)
    }
}
