/*!
 * Core Module
 * Fundamental types, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod timeouts;
pub mod types;

// Re-export for convenience
pub use config::{DeadlineConfig, WatchdogMode};
pub use errors::{ConfigError, DeadlineError, DisruptionError};
pub use timeouts::{timeout_from_millis, validate_timeout, TimeoutTable};
pub use types::{DeadlineId, IdSequence, OutcomeKind};
