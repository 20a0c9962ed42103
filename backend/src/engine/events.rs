//! Engine event queue
//!
//! A min-ordered queue of timestamped events. Ties break on insertion
//! order, which keeps event dispatch fully deterministic for identical
//! schedules.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Payload of a queued event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// One passenger for one demand record, arriving during a timeframe.
    Arrival { demand_idx: usize, tf_index: usize },

    /// Data collection point checkpoint.
    Dcp { dcp: u32, dcp_index: usize },

    /// Daily reoptimization checkpoint on a non-DCP day.
    Daily { days_prior: u32 },
}

/// What the engine hands back from `go()`: passenger arrivals are consumed
/// internally, only control events and the terminal sentinel surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Dcp { dcp: u32, dcp_index: usize },
    Daily { days_prior: u32 },
    /// The queue has drained; the sample is complete (implicit DCP 0).
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedEvent {
    time: i64,
    seq: u64,
    kind: EventKind,
}

// BinaryHeap is a max-heap; invert the ordering to pop earliest first.
impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.time, other.seq).cmp(&(self.time, self.seq))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic time-ordered event queue.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: i64, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEvent { time, seq, kind });
    }

    pub fn pop(&mut self) -> Option<(i64, EventKind)> {
        self.heap.pop().map(|ev| (ev.time, ev.kind))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_pop_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(30, EventKind::Daily { days_prior: 3 });
        queue.push(10, EventKind::Daily { days_prior: 1 });
        queue.push(20, EventKind::Daily { days_prior: 2 });

        let times: Vec<i64> = std::iter::from_fn(|| queue.pop().map(|(t, _)| t)).collect();
        assert_eq!(times, vec![10, 20, 30]);
    }

    #[test]
    fn test_ties_break_on_insertion_order() {
        let mut queue = EventQueue::new();
        queue.push(
            100,
            EventKind::Arrival {
                demand_idx: 0,
                tf_index: 0,
            },
        );
        queue.push(
            100,
            EventKind::Arrival {
                demand_idx: 1,
                tf_index: 0,
            },
        );

        let first = queue.pop().unwrap().1;
        assert_eq!(
            first,
            EventKind::Arrival {
                demand_idx: 0,
                tf_index: 0
            }
        );
    }
}
