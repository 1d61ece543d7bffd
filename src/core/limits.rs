/*!
 * Deadline Limits and Constants
 *
 * Centralized location for defaults and thresholds used by the deadline engine.
 *
 * - Values are grouped by component (watchdog, caller, worker)
 * - Performance-sensitive constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// WATCHDOG
// =============================================================================

/// Default watchdog poll interval (5ms)
/// Heap mode: upper bound on a single sleep. Poll mode: scan period.
/// [PERF] Lower values trade CPU wake-ups for detection latency
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poll interval for the low-latency preset (1ms)
pub const LOW_LATENCY_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Poll interval for the relaxed preset (25ms)
pub const RELAXED_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Longest accepted poll interval (60s)
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Extra heap entries tolerated before stale deadlines are pruned
/// [PERF] Pruning is O(n); slack keeps it off the common path
pub const HEAP_PRUNE_SLACK: usize = 64;

/// Name of the watchdog thread
pub const WATCHDOG_THREAD_NAME: &str = "deadline-watchdog";

// =============================================================================
// CALLER
// =============================================================================

/// Default caller-side grace after a deadline before the caller
/// resolves the record itself (50ms)
pub const DEFAULT_CALLER_GRACE: Duration = Duration::from_millis(50);

/// Caller grace for the low-latency preset (10ms)
pub const LOW_LATENCY_CALLER_GRACE: Duration = Duration::from_millis(10);

/// Caller grace for the relaxed preset (250ms)
pub const RELAXED_CALLER_GRACE: Duration = Duration::from_millis(250);

// =============================================================================
// WORKER
// =============================================================================

/// Default worker thread name prefix; threads are named `<prefix>-<id>`
pub const DEFAULT_WORKER_PREFIX: &str = "deadline-worker";

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "DEADLINE_CONFIG";
