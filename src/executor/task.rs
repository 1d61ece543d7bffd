/*!
 * Deadline Task
 * Caller-side handle to one dispatched operation
 */

use super::runner::DeadlineExecutor;
use crate::core::errors::DeadlineError;
use crate::core::types::{DeadlineId, OutcomeKind};
use crate::deadline::DeadlineRecord;
use crate::watchdog::terminate;
use crate::worker::{Finished, OutcomeSlot};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A dispatched operation that has not been waited on yet
///
/// Dropping the task without calling [`wait`](Self::wait) cancels the
/// operation.
#[must_use = "dropping a DeadlineTask cancels its operation"]
pub struct DeadlineTask<T, E> {
    executor: DeadlineExecutor,
    record: Arc<DeadlineRecord>,
    slot: OutcomeSlot<T, E>,
    waited: bool,
}

impl<T, E> DeadlineTask<T, E> {
    pub(super) fn new(
        executor: DeadlineExecutor,
        record: Arc<DeadlineRecord>,
        slot: OutcomeSlot<T, E>,
    ) -> Self {
        Self {
            executor,
            record,
            slot,
            waited: false,
        }
    }

    #[inline]
    pub fn id(&self) -> DeadlineId {
        self.record.id()
    }

    #[inline]
    pub fn deadline(&self) -> Instant {
        self.record.deadline()
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.record.timeout()
    }

    /// Whether the outcome is already decided
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.record.outcome().is_terminal()
    }

    pub fn cancel(&self) -> bool {
        self.executor.cancel(self.id())
    }

    /// Block until the operation finishes, times out or is cancelled
    pub fn wait(mut self) -> Result<T, DeadlineError<E>> {
        self.waited = true;
        let outcome = self.await_outcome();
        self.into_result(outcome)
    }

    fn await_outcome(&self) -> OutcomeKind {
        let inner = &self.executor.inner;
        let deadline = self.record.deadline();
        let limit = deadline
            .checked_add(inner.config.caller_grace)
            .unwrap_or(deadline);

        let outcome = self.record.wait_until(limit);
        if outcome.is_terminal() {
            return outcome;
        }

        // Watchdog stalled or stopped; resolve the timeout here.
        if terminate(&inner.registry, self.id(), OutcomeKind::TimedOut, "caller") {
            inner.registry.stats().inc_caller_fallbacks();
            warn!(
                id = %self.id(),
                grace_ms = inner.config.caller_grace.as_millis() as u64,
                "Watchdog missed deadline; caller resolved timeout"
            );
        }
        self.record.wait()
    }

    fn into_result(&self, outcome: OutcomeKind) -> Result<T, DeadlineError<E>> {
        let id = self.id();
        match outcome {
            OutcomeKind::TimedOut | OutcomeKind::Pending => Err(DeadlineError::Timeout {
                id,
                elapsed_ms: self.record.elapsed().as_millis() as u64,
                timeout_ms: self.record.timeout().as_millis() as u64,
            }),
            OutcomeKind::Cancelled => Err(DeadlineError::Cancelled { id }),
            OutcomeKind::Completed | OutcomeKind::Failed | OutcomeKind::Panicked => {
                match self.slot.lock().take() {
                    Some(Finished::Value(value)) => Ok(value),
                    Some(Finished::Error(error)) => Err(DeadlineError::Operation(error)),
                    Some(Finished::Panic(message)) => Err(DeadlineError::Panicked { id, message }),
                    // The worker stores its payload before resolving
                    None => Err(DeadlineError::Panicked {
                        id,
                        message: "worker outcome missing".to_string(),
                    }),
                }
            }
        }
    }
}

impl<T, E> Drop for DeadlineTask<T, E> {
    fn drop(&mut self) {
        if !self.waited && self.record.is_pending() && self.cancel() {
            debug!(id = %self.id(), "Task dropped before wait; operation cancelled");
        }
    }
}

impl<T, E> fmt::Debug for DeadlineTask<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineTask")
            .field("id", &self.id())
            .field("timeout", &self.timeout())
            .field("outcome", &self.record.outcome())
            .finish()
    }
}
