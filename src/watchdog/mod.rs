/*!
 * Watchdog
 * Deadline detection on a dedicated background thread
 */

mod monitor;
mod queue;

pub use monitor::Watchdog;

pub(crate) use monitor::terminate;
