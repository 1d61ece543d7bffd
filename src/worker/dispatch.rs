/*!
 * Worker Dispatch
 *
 * Runs each blocking operation on its own named thread and reports the
 * outcome back to the execution registry. Worker threads are detached; a
 * live-count guard tracks them until the thread body returns, including on
 * unwind.
 *
 * The typed payload travels through an `OutcomeSlot` shared with the caller.
 * It is written before the worker tries to resolve the record, so a caller
 * woken by a worker outcome always finds it there. A worker that loses the
 * race drops its payload on its own thread.
 */

use super::handle::WorkerHandle;
use crate::core::config::DeadlineConfig;
use crate::core::types::{DeadlineId, OutcomeKind};
use crate::deadline::{DeadlineRecord, ExecutionRegistry};
use crate::interrupt::{CurrentTokenGuard, InterruptToken, Interruptible, WakeupSignal};
use crate::monitoring::DeadlineSpan;
use parking_lot::Mutex;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// What the operation produced on its worker thread
pub(crate) enum Finished<T, E> {
    Value(T),
    Error(E),
    Panic(String),
}

impl<T, E> Finished<T, E> {
    fn kind(&self) -> OutcomeKind {
        match self {
            Self::Value(_) => OutcomeKind::Completed,
            Self::Error(_) => OutcomeKind::Failed,
            Self::Panic(_) => OutcomeKind::Panicked,
        }
    }
}

pub(crate) type OutcomeSlot<T, E> = Arc<Mutex<Option<Finished<T, E>>>>;

pub(crate) fn outcome_slot<T, E>() -> OutcomeSlot<T, E> {
    Arc::new(Mutex::new(None))
}

/// Counts a worker thread as live until dropped
struct LiveWorker(Arc<AtomicUsize>);

impl LiveWorker {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Spawns and tracks worker threads
pub struct WorkerDispatch {
    name_prefix: String,
    stack_size: Option<usize>,
    wakeup: Option<WakeupSignal>,
    live: Arc<AtomicUsize>,
}

impl WorkerDispatch {
    pub fn new(config: &DeadlineConfig, wakeup: Option<WakeupSignal>) -> Self {
        Self {
            name_prefix: config.worker_name_prefix.clone(),
            stack_size: config.worker_stack_size,
            wakeup,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create the handle for a record before the record is registered
    pub fn prepare(&self, id: DeadlineId) -> WorkerHandle {
        WorkerHandle::with_wakeup(id, self.wakeup)
    }

    /// Run `operation` on a dedicated thread for `record`
    ///
    /// On return the worker resolves the record as completed, failed or
    /// panicked; if the record was already resolved the payload is dropped.
    /// A record resolved before the thread starts never runs `operation`.
    pub(crate) fn dispatch<T, E, F>(
        &self,
        registry: &Arc<ExecutionRegistry>,
        record: &Arc<DeadlineRecord>,
        slot: OutcomeSlot<T, E>,
        operation: F,
    ) -> io::Result<()>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce(&InterruptToken) -> Result<T, E> + Send + 'static,
    {
        let id = record.id();
        let timeout = record.timeout();
        let state = Arc::clone(record.worker().state());
        let token = record.worker().token();
        let registry = Arc::clone(registry);
        let live = LiveWorker::new(&self.live);

        let mut builder = thread::Builder::new().name(format!("{}-{}", self.name_prefix, id));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        let record = Arc::clone(record);
        builder.spawn(move || {
            let _live = live;
            state.attach_current();
            let span = DeadlineSpan::new(id, timeout);

            // Resolvers interrupt after resolving, so a record still pending
            // here gets any later interrupt delivered to this thread
            if !record.is_pending() {
                registry.stats().inc_late_completions();
                state.detach();
                debug!(
                    id = %id,
                    outcome = %record.outcome(),
                    "operation skipped, record already resolved"
                );
                span.finish(record.outcome(), false);
                return;
            }

            let finished = {
                let _current = CurrentTokenGuard::enter(token.clone());
                let _entered = span.enter();
                match panic::catch_unwind(AssertUnwindSafe(|| operation(&token))) {
                    Ok(Ok(value)) => Finished::Value(value),
                    Ok(Err(error)) => Finished::Error(error),
                    Err(payload) => Finished::Panic(panic_message(payload.as_ref())),
                }
            };

            let outcome = finished.kind();
            *slot.lock() = Some(finished);
            let won = registry.resolve(id, outcome);
            if !won {
                registry.stats().inc_late_completions();
                drop(slot.lock().take());
            }

            state.detach();
            span.finish(outcome, won);
        })?;

        Ok(())
    }

    /// Fire-and-forget interrupt request; never waits for the target
    ///
    /// Returns `true` only for the request that raised the interrupt.
    #[inline]
    pub fn request_interrupt(target: &dyn Interruptible) -> bool {
        target.request_interrupt()
    }

    /// Worker threads whose body has not returned yet
    #[inline]
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}
