/*!
 * Deadline Record
 *
 * Passive description of one in-flight operation. The outcome cell is a
 * tagged `u8` that moves from `Pending` to exactly one terminal state through
 * a single compare-and-set; the mutex/condvar pair exists only to park the
 * waiting caller and never guards the outcome itself.
 */

use crate::core::errors::ConfigError;
use crate::core::types::{DeadlineId, OutcomeKind};
use crate::worker::WorkerHandle;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

pub struct DeadlineRecord {
    id: DeadlineId,
    created_at: Instant,
    deadline: Instant,
    timeout: Duration,
    worker: WorkerHandle,
    outcome: AtomicU8,
    parked: Mutex<()>,
    resolved: Condvar,
}

impl DeadlineRecord {
    /// Create a pending record whose deadline is `now + timeout`
    pub fn new(
        id: DeadlineId,
        timeout: Duration,
        worker: WorkerHandle,
    ) -> Result<Self, ConfigError> {
        let created_at = Instant::now();
        let deadline = created_at
            .checked_add(timeout)
            .ok_or(ConfigError::TimeoutOverflow)?;

        Ok(Self {
            id,
            created_at,
            deadline,
            timeout,
            worker,
            outcome: AtomicU8::new(OutcomeKind::Pending as u8),
            parked: Mutex::new(()),
            resolved: Condvar::new(),
        })
    }

    #[inline]
    pub fn id(&self) -> DeadlineId {
        self.id
    }

    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handle used to interrupt the worker running this record's operation
    #[inline]
    pub fn worker(&self) -> &WorkerHandle {
        &self.worker
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    #[inline]
    pub fn outcome(&self) -> OutcomeKind {
        OutcomeKind::from_u8(self.outcome.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.outcome() == OutcomeKind::Pending
    }

    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// The single pending -> terminal transition
    ///
    /// Only the registry calls this, inside its removal critical section.
    #[inline]
    pub(crate) fn try_resolve(&self, outcome: OutcomeKind) -> bool {
        debug_assert!(outcome.is_terminal(), "records never resolve to pending");
        if !outcome.is_terminal() {
            return false;
        }
        self.outcome
            .compare_exchange(
                OutcomeKind::Pending as u8,
                outcome as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Wake the caller parked in `wait`/`wait_until`
    pub(crate) fn notify_resolved(&self) {
        // Taking the lock orders the notify after a waiter that checked the
        // outcome but has not parked yet.
        let _parked = self.parked.lock();
        self.resolved.notify_all();
    }

    /// Block until the record reaches a terminal state
    pub fn wait(&self) -> OutcomeKind {
        let mut parked = self.parked.lock();
        loop {
            let outcome = self.outcome();
            if outcome.is_terminal() {
                return outcome;
            }
            self.resolved.wait(&mut parked);
        }
    }

    /// Block until the record is resolved or `limit` passes
    ///
    /// Returns `OutcomeKind::Pending` if the limit was reached first.
    pub fn wait_until(&self, limit: Instant) -> OutcomeKind {
        let mut parked = self.parked.lock();
        loop {
            let outcome = self.outcome();
            if outcome.is_terminal() {
                return outcome;
            }
            if self.resolved.wait_until(&mut parked, limit).timed_out() {
                return self.outcome();
            }
        }
    }
}

impl fmt::Debug for DeadlineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineRecord")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .field("outcome", &self.outcome())
            .finish()
    }
}
