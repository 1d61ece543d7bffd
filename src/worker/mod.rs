/*!
 * Workers
 * One detached, named thread per dispatched operation
 */

mod dispatch;
mod handle;

pub use dispatch::WorkerDispatch;
pub use handle::WorkerHandle;

pub(crate) use dispatch::{outcome_slot, Finished, OutcomeSlot};
