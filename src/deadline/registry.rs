/*!
 * Execution Registry
 *
 * Concurrent map of in-flight deadline records. All outcome transitions go
 * through `resolve`, which runs the record's compare-and-set inside DashMap's
 * `remove_if`, so the outcome write and the removal happen in the same shard
 * critical section: exactly one resolver wins and removes the entry.
 *
 * Winning outcomes are counted in the shared `DeadlineStats` before the
 * waiting caller is woken, so a caller that returns sees its own outcome
 * reflected in the counters.
 *
 * Enumeration (`snapshot`, `expired`) locks one shard at a time. Entries
 * inserted after a scan started may be missed until the next scan, and entries
 * removed mid-scan may still be returned; resolving those simply loses.
 */

use super::record::DeadlineRecord;
use crate::core::types::{DeadlineId, IdSequence, OutcomeKind};
use crate::monitoring::DeadlineStats;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

pub struct ExecutionRegistry {
    records: DashMap<DeadlineId, Arc<DeadlineRecord>, RandomState>,
    ids: IdSequence,
    stats: Arc<DeadlineStats>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::with_hasher(RandomState::new()),
            ids: IdSequence::new(),
            stats: Arc::new(DeadlineStats::new()),
        }
    }

    #[inline]
    pub fn stats(&self) -> &Arc<DeadlineStats> {
        &self.stats
    }

    /// Allocate the identity for a record about to be registered
    #[inline]
    pub fn next_id(&self) -> DeadlineId {
        self.ids.next()
    }

    /// Insert a pending record
    pub fn register(&self, record: Arc<DeadlineRecord>) -> DeadlineId {
        let id = record.id();
        let previous = self.records.insert(id, record);
        debug_assert!(previous.is_none(), "deadline id {} registered twice", id);
        self.stats.inc_registered();
        id
    }

    /// Resolve a record; `true` only for the call that won the transition
    #[inline]
    pub fn resolve(&self, id: DeadlineId, outcome: OutcomeKind) -> bool {
        self.resolve_record(id, outcome).is_some()
    }

    /// Resolve a record, handing it to the winner
    ///
    /// The winner's record has already been removed from the registry and its
    /// waiting caller woken. Losers (already resolved, or unknown id) get
    /// `None`.
    pub fn resolve_record(
        &self,
        id: DeadlineId,
        outcome: OutcomeKind,
    ) -> Option<Arc<DeadlineRecord>> {
        let (_, record) = self
            .records
            .remove_if(&id, |_, record| record.try_resolve(outcome))?;
        self.stats.record_outcome(outcome);
        record.notify_resolved();
        Some(record)
    }

    /// Pending records at scan time
    pub fn snapshot(&self) -> Vec<Arc<DeadlineRecord>> {
        self.records
            .iter()
            .filter(|entry| entry.value().is_pending())
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Pending records whose deadline is at or before `now`
    pub fn expired(&self, now: Instant) -> Vec<Arc<DeadlineRecord>> {
        self.records
            .iter()
            .filter(|entry| entry.value().is_pending() && entry.value().is_expired(now))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Drop a record without writing an outcome (dispatch failure, cleanup)
    pub fn remove(&self, id: DeadlineId) -> bool {
        self.records.remove(&id).is_some()
    }

    pub fn get(&self, id: DeadlineId) -> Option<Arc<DeadlineRecord>> {
        self.records.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    #[inline]
    pub fn contains(&self, id: DeadlineId) -> bool {
        self.records.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ExecutionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerHandle;
    use std::time::Duration;

    fn register(registry: &ExecutionRegistry, timeout: Duration) -> DeadlineId {
        let id = registry.next_id();
        let record = DeadlineRecord::new(id, timeout, WorkerHandle::new(id)).unwrap();
        registry.register(Arc::new(record))
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = ExecutionRegistry::new();
        let id = register(&registry, Duration::from_secs(1));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));

        assert!(registry.resolve(id, OutcomeKind::Completed));
        assert!(registry.is_empty());
        assert!(!registry.resolve(id, OutcomeKind::TimedOut));

        let stats = registry.stats().snapshot();
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.timed_out, 0);
    }

    #[test]
    fn test_resolve_unknown_id_loses() {
        let registry = ExecutionRegistry::new();
        assert!(!registry.resolve(DeadlineId(42), OutcomeKind::TimedOut));
    }

    #[test]
    fn test_winner_receives_record() {
        let registry = ExecutionRegistry::new();
        let id = register(&registry, Duration::from_secs(1));
        let record = registry.get(id).unwrap();

        let won = registry.resolve_record(id, OutcomeKind::Cancelled).unwrap();
        assert_eq!(won.id(), id);
        assert_eq!(record.outcome(), OutcomeKind::Cancelled);
    }

    #[test]
    fn test_expired_filters_by_deadline() {
        let registry = ExecutionRegistry::new();
        let short = register(&registry, Duration::from_millis(1));
        let long = register(&registry, Duration::from_secs(60));

        let later = Instant::now() + Duration::from_millis(10);
        let expired: Vec<_> = registry.expired(later).iter().map(|r| r.id()).collect();
        assert_eq!(expired, vec![short]);
        assert_eq!(registry.snapshot().len(), 2);
        assert!(registry.remove(long));
        assert!(!registry.remove(long));
    }
}
