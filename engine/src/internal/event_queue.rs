//! A min-ordered event queue keyed by `(time, phase, insertion order)`.
//!
//! Two distinct call sites use this same structure with different phase
//! vocabularies: the main driver (`driver_phase`) and the
//! boundary phase processor (`boundary_phase`). The queue never dedupes;
//! entries that tie on `(time, phase)` keep their relative declaration
//! order, which is what `seq` (assigned at push time) guarantees.

use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Phase priorities used by the main simulation driver.
pub mod driver_phase {
    pub const COMMAND: u32 = 10;
    pub const EVALUATION: u32 = 100;
}

/// Phase priorities used by the boundary phase processor.
pub mod boundary_phase {
    pub const COMPLETION: u32 = 10;
    pub const DEPLETION: u32 = 20;
    pub const DEFERRED: u32 = 30;
    pub const TRIGGER: u32 = 40;
    pub const AUTOMATION: u32 = 50;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EventKey {
    time: OrderedFloat<f64>,
    phase: u32,
    seq: u64,
}

struct Entry<T> {
    key: EventKey,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl<T> Eq for Entry<T> {}
impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

pub struct EventQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        EventQueue {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Enqueue `payload` at `time`/`phase`. Insertion order among ties is
    /// the order in which `push` was called.
    pub fn push(&mut self, time: f64, phase: u32, payload: T) {
        let key = EventKey {
            time: OrderedFloat(time),
            phase,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { key, payload }));
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(e)| e.key.time.0)
    }

    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|Reverse(e)| (e.key.time.0, e.payload))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
