/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::DeadlineId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors, reported synchronously before any thread is spawned
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Timeout must be positive, got {millis}ms")]
    #[diagnostic(
        code(config::non_positive_timeout),
        help("Deadlines are relative to now; use a duration of at least 1ms.")
    )]
    NonPositiveTimeout { millis: i64 },

    #[error("Timeout is too large to compute a deadline")]
    #[diagnostic(
        code(config::timeout_overflow),
        help("The timeout overflows the monotonic clock. Use a realistic duration.")
    )]
    TimeoutOverflow,

    #[error("No timeout configured for route '{0}' and no default set")]
    #[diagnostic(
        code(config::missing_timeout),
        help("Add the route to the timeout table or configure `default_ms`.")
    )]
    MissingTimeout(String),

    #[error("Watchdog poll interval must be between 1ms and 60s")]
    #[diagnostic(
        code(config::invalid_poll_interval),
        help("The poll interval bounds how late a timeout can be detected.")
    )]
    InvalidPollInterval,

    #[error("Invalid worker thread name prefix: {0:?}")]
    #[diagnostic(
        code(config::invalid_worker_name),
        help("The prefix must be non-empty and must not contain NUL bytes.")
    )]
    InvalidWorkerName(String),

    #[error("Unsupported wake-up signal: {0}")]
    #[diagnostic(
        code(config::unsupported_signal),
        help("Use SIGUSR1 or SIGUSR2 on unix platforms, or leave it unset.")
    )]
    UnsupportedSignal(String),

    #[error("Failed to parse configuration: {0}")]
    #[diagnostic(code(config::parse_failed), help("Check the JSON syntax and field names."))]
    Parse(String),

    #[error("Failed to read configuration: {0}")]
    #[diagnostic(code(config::io_failed))]
    Io(String),

    #[error("Failed to start deadline executor: {0}")]
    #[diagnostic(
        code(config::startup_failed),
        help("The watchdog thread or signal handler could not be installed.")
    )]
    Startup(String),
}

/// Outcome error of a deadline-bounded execution
///
/// Generic over the wrapped operation's own error type, which is forwarded
/// unchanged in [`DeadlineError::Operation`].
#[derive(Debug, Error)]
pub enum DeadlineError<E> {
    /// Deadline elapsed; the operation may still be running in the background
    #[error("Operation {id} timed out after {elapsed_ms}ms (timeout: {timeout_ms}ms)")]
    Timeout {
        id: DeadlineId,
        elapsed_ms: u64,
        timeout_ms: u64,
    },

    /// Operation failed before its deadline
    #[error("Operation failed: {0}")]
    Operation(#[source] E),

    /// Rejected before dispatch
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("Operation {id} was cancelled")]
    Cancelled { id: DeadlineId },

    #[error("Operation {id} panicked: {message}")]
    Panicked { id: DeadlineId, message: String },

    #[error("Failed to spawn worker thread: {0}")]
    Dispatch(#[source] std::io::Error),

    #[error("Deadline executor has been shut down")]
    Shutdown,
}

impl<E> DeadlineError<E> {
    /// Check if this is a timeout error
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an operation error
    #[inline]
    pub fn is_operation_error(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Check if this is a configuration error
    #[inline]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }

    /// Take the operation's own error, if that is what this is
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure injected by a [`Disruptor`](crate::disruption::Disruptor)
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum DisruptionError {
    #[error("Injected failure in group '{group}': {message}")]
    #[diagnostic(code(disruption::injected))]
    Injected { group: String, message: String },

    #[error("Injected delay in group '{group}' was interrupted")]
    #[diagnostic(
        code(disruption::interrupted),
        help("The surrounding deadline expired or the operation was cancelled.")
    )]
    Interrupted { group: String },
}

impl From<DisruptionError> for std::io::Error {
    fn from(err: DisruptionError) -> Self {
        let kind = match err {
            DisruptionError::Interrupted { .. } => std::io::ErrorKind::Interrupted,
            DisruptionError::Injected { .. } => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
