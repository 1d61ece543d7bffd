/*!
 * Deadline Executor Configuration
 *
 * Precision knobs for the watchdog and worker threads. Durations are
 * expressed in milliseconds on the wire.
 *
 * ## Example
 *
 * ```json
 * {
 *   "watchdog": "heap",
 *   "poll_interval_ms": 5,
 *   "caller_grace_ms": 50,
 *   "worker_name_prefix": "http-call",
 *   "wakeup_signal": "SIGUSR2"
 * }
 * ```
 */

use super::errors::ConfigError;
use super::limits::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::path::Path;
use std::time::Duration;

/// How the watchdog finds expired records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogMode {
    /// Sleep until the next-soonest deadline (min-heap)
    #[default]
    Heap,
    /// Scan the whole registry every poll interval
    Poll,
}

/// Configuration for a [`DeadlineExecutor`](crate::executor::DeadlineExecutor)
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineConfig {
    /// Watchdog wake-up strategy
    pub watchdog: WatchdogMode,

    /// Heap mode: longest single watchdog sleep. Poll mode: scan period.
    #[serde(rename = "poll_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,

    /// How long past its deadline a caller waits for the watchdog before
    /// resolving the timeout itself
    #[serde(rename = "caller_grace_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub caller_grace: Duration,

    /// Worker threads are named `<prefix>-<id>`
    pub worker_name_prefix: String,

    /// Worker stack size in bytes (platform default when unset)
    pub worker_stack_size: Option<usize>,

    /// Signal delivered to interrupted workers so blocking syscalls return
    /// `EINTR` (unix only, `SIGUSR1` or `SIGUSR2`)
    pub wakeup_signal: Option<String>,
}

impl DeadlineConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self {
            watchdog: WatchdogMode::Heap,
            poll_interval: DEFAULT_POLL_INTERVAL,
            caller_grace: DEFAULT_CALLER_GRACE,
            worker_name_prefix: DEFAULT_WORKER_PREFIX.to_string(),
            worker_stack_size: None,
            wakeup_signal: None,
        }
    }

    /// Tighter detection latency at the cost of more watchdog wake-ups
    pub fn low_latency() -> Self {
        Self {
            poll_interval: LOW_LATENCY_POLL_INTERVAL,
            caller_grace: LOW_LATENCY_CALLER_GRACE,
            ..Self::new()
        }
    }

    /// Fewer wake-ups for slow or heavily loaded environments
    pub fn relaxed() -> Self {
        Self {
            poll_interval: RELAXED_POLL_INTERVAL,
            caller_grace: RELAXED_CALLER_GRACE,
            ..Self::new()
        }
    }

    pub fn with_watchdog(mut self, mode: WatchdogMode) -> Self {
        self.watchdog = mode;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_caller_grace(mut self, grace: Duration) -> Self {
        self.caller_grace = grace;
        self
    }

    pub fn with_worker_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_name_prefix = prefix.into();
        self
    }

    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    pub fn with_wakeup_signal(mut self, signal: impl Into<String>) -> Self {
        self.wakeup_signal = Some(signal.into());
        self
    }

    /// Check every field; called by the executor before anything is started
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() || self.poll_interval > MAX_POLL_INTERVAL {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.worker_name_prefix.is_empty() || self.worker_name_prefix.contains('\0') {
            return Err(ConfigError::InvalidWorkerName(self.worker_name_prefix.clone()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Load from the file named by `DEADLINE_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::new()),
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self::new()
    }
}
