/*!
 * Core Types
 * Identity and outcome types shared by the registry, watchdog and executor
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one in-flight operation (unique within a registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeadlineId(pub u64);

impl fmt::Display for DeadlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id sequence
///
/// Cache-line aligned; the counter is bumped once per dispatched operation.
#[repr(C, align(64))]
#[derive(Debug)]
pub struct IdSequence {
    counter: AtomicU64,
}

impl IdSequence {
    /// Create a sequence whose first id is 1
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Allocate the next id
    #[inline]
    pub fn next(&self) -> DeadlineId {
        DeadlineId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a deadline record's outcome cell
///
/// Stored as a `u8` so the pending -> terminal transition is a single
/// compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OutcomeKind {
    /// Operation still running, nobody has resolved the record
    Pending = 0,
    /// Operation returned `Ok`
    Completed = 1,
    /// Operation returned `Err`
    Failed = 2,
    /// Operation panicked on its worker thread
    Panicked = 3,
    /// Deadline elapsed first
    TimedOut = 4,
    /// Explicitly cancelled
    Cancelled = 5,
}

impl OutcomeKind {
    #[inline]
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Completed,
            2 => Self::Failed,
            3 => Self::Panicked,
            4 => Self::TimedOut,
            5 => Self::Cancelled,
            _ => Self::Pending,
        }
    }

    /// Whether this is a final state
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the worker produced this outcome (as opposed to the deadline
    /// or a cancellation)
    #[inline]
    pub const fn is_worker_outcome(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Panicked)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Panicked => "panicked",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
