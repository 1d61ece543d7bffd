/*!
 * Monitoring
 * Outcome statistics and structured tracing
 */

mod stats;
mod tracer;

pub use stats::{DeadlineStats, StatsSnapshot};
pub use tracer::{init_tracing, DeadlineSpan};
