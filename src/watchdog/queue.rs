/*!
 * Deadline Queue
 * Min-heap of pending deadlines with lazy removal of resolved entries
 */

use crate::core::limits::HEAP_PRUNE_SLACK;
use crate::core::types::DeadlineId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct QueueEntry {
    pub deadline: Instant,
    pub id: DeadlineId,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reversed so the soonest deadline is on top
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Entries are never removed on resolution. They are skipped when popped
/// and pruned in bulk once the heap outgrows the registry.
#[derive(Debug, Default)]
pub(super) struct DeadlineQueue {
    heap: BinaryHeap<QueueEntry>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the new entry became the soonest deadline
    pub fn push(&mut self, id: DeadlineId, deadline: Instant) -> bool {
        let becomes_head = self.next_deadline().map_or(true, |head| deadline < head);
        self.heap.push(QueueEntry { deadline, id });
        becomes_head
    }

    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Pop every entry due at or before `now`, soonest first
    pub fn pop_expired(&mut self, now: Instant) -> Vec<DeadlineId> {
        let mut expired = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            expired.push(entry.id);
            self.heap.pop();
        }
        expired
    }

    /// Drop entries for records no longer pending, once the heap holds more
    /// than twice `live` entries plus slack. Returns the number removed.
    pub fn prune(&mut self, live: usize, is_pending: impl Fn(DeadlineId) -> bool) -> usize {
        let threshold = live.saturating_mul(2).saturating_add(HEAP_PRUNE_SLACK);
        if self.heap.len() <= threshold {
            return 0;
        }
        let before = self.heap.len();
        self.heap.retain(|entry| is_pending(entry.id));
        before - self.heap.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
