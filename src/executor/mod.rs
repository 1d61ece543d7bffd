/*!
 * Execution Wrapper
 * Public entry points for running operations under deadlines
 */

mod runner;
mod task;

pub use runner::DeadlineExecutor;
pub use task::DeadlineTask;
