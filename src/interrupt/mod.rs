/*!
 * Best-effort Interruption
 *
 * Rust threads cannot be preempted, so interruption is layered:
 * - a cooperative flag checked at poll points (`InterruptToken::check`)
 * - thread unpark, which wakes `InterruptToken::sleep` / `interrupt::sleep`
 * - operation-specific cancellation hooks (`InterruptToken::on_interrupt`)
 * - an optional wake-up signal that makes blocking syscalls return `EINTR`
 *
 * All layers are weaker than a true thread interrupt: an operation that
 * never polls and blocks in an uninterruptible call keeps running until it
 * returns on its own. Its outcome is then discarded.
 */

mod signal;
mod token;
mod traits;

pub use signal::WakeupSignal;
pub use token::{current, is_interrupted, sleep, InterruptToken, Interrupted};
pub use traits::Interruptible;

pub(crate) use token::{CurrentTokenGuard, InterruptState};
