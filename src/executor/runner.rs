/*!
 * Deadline Executor
 *
 * Owns one registry, one watchdog thread and the worker dispatcher. Cloning
 * the executor shares them; dropping the last clone stops the watchdog.
 */

use super::task::DeadlineTask;
use crate::core::config::DeadlineConfig;
use crate::core::errors::{ConfigError, DeadlineError};
use crate::core::timeouts::validate_timeout;
use crate::core::types::{DeadlineId, OutcomeKind};
use crate::deadline::{DeadlineRecord, ExecutionRegistry};
use crate::interrupt::{InterruptToken, WakeupSignal};
use crate::monitoring::StatsSnapshot;
use crate::watchdog::{terminate, Watchdog};
use crate::worker::{outcome_slot, WorkerDispatch};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

static SHARED: Mutex<Option<DeadlineExecutor>> = parking_lot::const_mutex(None);

pub(super) struct ExecutorInner {
    pub(super) config: DeadlineConfig,
    pub(super) registry: Arc<ExecutionRegistry>,
    dispatch: WorkerDispatch,
    watchdog: Watchdog,
    closed: AtomicBool,
}

impl Drop for ExecutorInner {
    fn drop(&mut self) {
        self.watchdog.shutdown();
        info!(
            live_workers = self.dispatch.live_workers(),
            "Deadline executor stopped"
        );
    }
}

/// Runs blocking operations under wall-clock deadlines
///
/// # Example
///
/// ```no_run
/// use deadline_guard::{DeadlineConfig, DeadlineExecutor};
/// use std::time::Duration;
///
/// let executor = DeadlineExecutor::new(DeadlineConfig::new())?;
/// let answer = executor.run_with_deadline(
///     || Ok::<_, std::io::Error>(42),
///     Duration::from_millis(50),
/// );
/// assert_eq!(answer.ok(), Some(42));
/// # Ok::<(), deadline_guard::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct DeadlineExecutor {
    pub(super) inner: Arc<ExecutorInner>,
}

impl DeadlineExecutor {
    /// Validate `config`, install the wake-up signal if any, and start the
    /// watchdog thread
    pub fn new(config: DeadlineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let wakeup = config
            .wakeup_signal
            .as_deref()
            .map(WakeupSignal::install)
            .transpose()?;

        let registry = Arc::new(ExecutionRegistry::new());
        let watchdog = Watchdog::start(Arc::clone(&registry), &config)
            .map_err(|e| ConfigError::Startup(format!("watchdog thread: {}", e)))?;
        let dispatch = WorkerDispatch::new(&config, wakeup);

        info!(
            watchdog = ?config.watchdog,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            caller_grace_ms = config.caller_grace.as_millis() as u64,
            wakeup_signal = wakeup.map(|s| s.name()).unwrap_or("none"),
            "Deadline executor started"
        );

        Ok(Self {
            inner: Arc::new(ExecutorInner {
                config,
                registry,
                dispatch,
                watchdog,
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(DeadlineConfig::new())
    }

    /// Process-wide executor, created on first use from `DEADLINE_CONFIG`
    /// (or defaults). Recreated if the previous one was shut down.
    pub fn shared() -> Result<Self, ConfigError> {
        let mut shared = SHARED.lock();
        if let Some(executor) = shared.as_ref() {
            if !executor.is_shutdown() {
                return Ok(executor.clone());
            }
        }
        let executor = Self::new(DeadlineConfig::from_env()?)?;
        *shared = Some(executor.clone());
        Ok(executor)
    }

    /// Run `operation` on a dedicated worker and wait at most `timeout`
    ///
    /// On `Timeout` the worker is asked to stop but may keep running in the
    /// background; its eventual result is discarded.
    pub fn run_with_deadline<T, E, F>(
        &self,
        operation: F,
        timeout: Duration,
    ) -> Result<T, DeadlineError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.run_interruptible(move |_| operation(), timeout)
    }

    /// Like [`run_with_deadline`](Self::run_with_deadline), handing the
    /// operation its interrupt token
    pub fn run_interruptible<T, E, F>(
        &self,
        operation: F,
        timeout: Duration,
    ) -> Result<T, DeadlineError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce(&InterruptToken) -> Result<T, E> + Send + 'static,
    {
        self.submit(operation, timeout)?.wait()
    }

    /// Dispatch without blocking; the returned task is waited on separately
    pub fn submit<T, E, F>(
        &self,
        operation: F,
        timeout: Duration,
    ) -> Result<DeadlineTask<T, E>, DeadlineError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce(&InterruptToken) -> Result<T, E> + Send + 'static,
    {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(DeadlineError::Shutdown);
        }

        let timeout = validate_timeout(timeout)?;
        let id = inner.registry.next_id();
        let record = Arc::new(DeadlineRecord::new(id, timeout, inner.dispatch.prepare(id))?);
        let slot = outcome_slot();

        inner.registry.register(Arc::clone(&record));
        inner.watchdog.schedule(id, record.deadline());

        if let Err(e) = inner
            .dispatch
            .dispatch(&inner.registry, &record, Arc::clone(&slot), operation)
        {
            inner.registry.remove(id);
            warn!(id = %id, error = %e, "Failed to spawn worker thread");
            return Err(DeadlineError::Dispatch(e));
        }

        debug!(id = %id, timeout_ms = timeout.as_millis() as u64, "Operation dispatched");
        Ok(DeadlineTask::new(self.clone(), record, slot))
    }

    /// Cancel a pending operation and interrupt its worker
    ///
    /// Returns `false` if it already completed, timed out or was cancelled.
    pub fn cancel(&self, id: DeadlineId) -> bool {
        terminate(&self.inner.registry, id, OutcomeKind::Cancelled, "cancel")
    }

    /// Operations registered and not yet resolved
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.inner.registry.len()
    }

    /// Worker threads still running, including ones whose result will be
    /// discarded
    #[inline]
    pub fn live_workers(&self) -> usize {
        self.inner.dispatch.live_workers()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.registry.stats().snapshot()
    }

    #[inline]
    pub fn config(&self) -> &DeadlineConfig {
        &self.inner.config
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Reject new operations, cancel pending ones and stop the watchdog
    ///
    /// Idempotent. Returns the number of operations cancelled.
    pub fn shutdown(&self) -> usize {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let cancelled = self
            .inner
            .registry
            .snapshot()
            .iter()
            .filter(|record| {
                terminate(&self.inner.registry, record.id(), OutcomeKind::Cancelled, "shutdown")
            })
            .count();
        self.inner.watchdog.shutdown();

        info!(cancelled, "Deadline executor shut down");
        cancelled
    }
}

impl std::fmt::Debug for DeadlineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineExecutor")
            .field("in_flight", &self.in_flight())
            .field("live_workers", &self.live_workers())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
