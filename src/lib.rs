/*!
 * Deadline Guard Library
 * Wall-clock deadlines for blocking operations
 *
 * Each operation runs on its own worker thread while the caller waits at most
 * the configured duration. A watchdog thread resolves expired operations as
 * timed out and interrupts their workers on a best-effort basis; a worker's
 * result that arrives after the deadline is discarded.
 */

pub mod core;
pub mod deadline;
pub mod disruption;
pub mod executor;
pub mod interrupt;
pub mod monitoring;
pub mod watchdog;
pub mod worker;

// Re-exports
pub use crate::core::{
    timeout_from_millis, validate_timeout, ConfigError, DeadlineConfig, DeadlineError, DeadlineId,
    DisruptionError, OutcomeKind, TimeoutTable, WatchdogMode,
};
pub use deadline::{DeadlineRecord, ExecutionRegistry};
pub use disruption::Disruptor;
pub use executor::{DeadlineExecutor, DeadlineTask};
pub use interrupt::{InterruptToken, Interrupted, Interruptible, WakeupSignal};
pub use monitoring::{init_tracing, DeadlineStats, StatsSnapshot};
pub use watchdog::Watchdog;
pub use worker::{WorkerDispatch, WorkerHandle};
