/*!
 * Lock-Free Deadline Statistics
 * Atomic counters for outcome tracking on the worker, watchdog and caller paths
 */

use crate::core::types::OutcomeKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic deadline statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Relaxed ordering; snapshots are not a consistent cut across counters
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct DeadlineStats {
    registered: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    interrupts_sent: AtomicU64,
    late_completions: AtomicU64,
    caller_fallbacks: AtomicU64,
}

impl DeadlineStats {
    pub const fn new() -> Self {
        Self {
            registered: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            interrupts_sent: AtomicU64::new(0),
            late_completions: AtomicU64::new(0),
            caller_fallbacks: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_registered(&self) {
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a winning resolution
    #[inline]
    pub fn record_outcome(&self, outcome: OutcomeKind) {
        let counter = match outcome {
            OutcomeKind::Completed => &self.completed,
            OutcomeKind::Failed => &self.failed,
            OutcomeKind::Panicked => &self.panicked,
            OutcomeKind::TimedOut => &self.timed_out,
            OutcomeKind::Cancelled => &self.cancelled,
            OutcomeKind::Pending => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_interrupts_sent(&self) {
        self.interrupts_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// A worker finished after its record was already resolved
    #[inline(always)]
    pub fn inc_late_completions(&self) {
        self.late_completions.fetch_add(1, Ordering::Relaxed);
    }

    /// A caller resolved its own timeout because the watchdog was late
    #[inline(always)]
    pub fn inc_caller_fallbacks(&self) {
        self.caller_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            interrupts_sent: self.interrupts_sent.load(Ordering::Relaxed),
            late_completions: self.late_completions.load(Ordering::Relaxed),
            caller_fallbacks: self.caller_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DeadlineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub interrupts_sent: u64,
    pub late_completions: u64,
    pub caller_fallbacks: u64,
}

impl StatsSnapshot {
    /// Operations that reached any terminal state
    pub fn resolved(&self) -> u64 {
        self.completed + self.failed + self.panicked + self.timed_out + self.cancelled
    }
}
