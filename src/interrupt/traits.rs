/*!
 * Interruption Traits
 */

/// Capability to ask one thread of execution to stop
///
/// Implementations must be idempotent: requesting twice has the same effect
/// as once, and requesting after the target finished is a no-op. Requests are
/// fire-and-forget and never wait for the target to actually stop.
///
/// Rust threads cannot be preempted, so every implementation in this crate is
/// best-effort: the target observes the request at its next poll point,
/// park, registered cancellation hook, or (with a wake-up signal) the next
/// interrupted syscall.
pub trait Interruptible: Send + Sync {
    /// Ask the target to stop; `true` only for the request that raised it
    fn request_interrupt(&self) -> bool;

    /// Whether an interrupt has been requested
    fn is_interrupted(&self) -> bool;
}
