/*!
 * Interrupt State and Tokens
 *
 * One `InterruptState` exists per dispatched operation. The interrupting side
 * (watchdog, canceller or caller fallback) flips the flag exactly once and
 * then, under the attachment lock:
 * - unparks the worker thread (wakes `InterruptToken::sleep`)
 * - delivers the wake-up signal, if configured and the worker is attached
 * - takes the registered cancellation hooks and runs them after unlocking
 *
 * The worker side sees the same state through an `InterruptToken`.
 */

#[cfg(unix)]
use super::signal::ThreadTarget;
use super::signal::WakeupSignal;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};
use tracing::{error, warn};

type InterruptHook = Box<dyn FnOnce() + Send + 'static>;

/// Returned when an operation observes an interrupt request
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation was interrupted")]
pub struct Interrupted;

impl From<Interrupted> for std::io::Error {
    fn from(_: Interrupted) -> Self {
        std::io::Error::new(std::io::ErrorKind::Interrupted, Interrupted)
    }
}

#[derive(Default)]
struct Attachment {
    thread: Option<Thread>,
    #[cfg(unix)]
    target: Option<ThreadTarget>,
    hooks: Vec<InterruptHook>,
    finished: bool,
}

pub(crate) struct InterruptState {
    requested: AtomicBool,
    wakeup: Option<WakeupSignal>,
    attachment: Mutex<Attachment>,
}

impl InterruptState {
    pub(crate) fn new(wakeup: Option<WakeupSignal>) -> Self {
        Self {
            requested: AtomicBool::new(false),
            wakeup,
            attachment: Mutex::new(Attachment::default()),
        }
    }

    /// Bind the state to the calling (worker) thread
    pub(crate) fn attach_current(&self) {
        let mut attachment = self.attachment.lock();
        attachment.thread = Some(thread::current());
        #[cfg(unix)]
        {
            attachment.target = Some(ThreadTarget::current());
        }
    }

    /// Called by the worker right before it exits. No signal is delivered
    /// and no hook runs after this returns.
    pub(crate) fn detach(&self) {
        let mut attachment = self.attachment.lock();
        attachment.finished = true;
        attachment.thread = None;
        #[cfg(unix)]
        {
            attachment.target = None;
        }
        attachment.hooks.clear();
    }

    #[inline]
    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Returns `true` only for the call that actually raised the flag
    pub(crate) fn request(&self) -> bool {
        if self.requested.swap(true, Ordering::AcqRel) {
            return false;
        }

        let hooks = {
            let mut attachment = self.attachment.lock();
            if !attachment.finished {
                if let Some(thread) = &attachment.thread {
                    thread.unpark();
                }
                #[cfg(unix)]
                {
                    if let (Some(target), Some(signal)) = (attachment.target, self.wakeup) {
                        if let Err(e) = target.deliver(signal) {
                            warn!(
                                signal = signal.name(),
                                error = %e,
                                "Failed to deliver wake-up signal"
                            );
                        }
                    }
                }
            }
            std::mem::take(&mut attachment.hooks)
        };

        run_hooks(hooks);
        true
    }

    pub(crate) fn register_hook(&self, hook: InterruptHook) {
        let mut attachment = self.attachment.lock();
        if attachment.finished {
            return;
        }
        if self.is_requested() {
            drop(attachment);
            run_hooks(vec![hook]);
            return;
        }
        attachment.hooks.push(hook);
    }
}

fn run_hooks(hooks: Vec<InterruptHook>) {
    for hook in hooks {
        if panic::catch_unwind(AssertUnwindSafe(hook)).is_err() {
            error!("Interrupt hook panicked; continuing with remaining hooks");
        }
    }
}

/// Worker-side view of an interrupt request
///
/// Handed to operations run through
/// [`DeadlineExecutor::run_interruptible`](crate::executor::DeadlineExecutor::run_interruptible),
/// and reachable from any operation through [`current`](super::current).
#[derive(Clone)]
pub struct InterruptToken {
    state: Arc<InterruptState>,
}

impl InterruptToken {
    pub(crate) fn from_state(state: Arc<InterruptState>) -> Self {
        Self { state }
    }

    /// Whether the deadline (or a cancellation) asked this operation to stop
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.state.is_requested()
    }

    /// `Err(Interrupted)` once an interrupt was requested
    #[inline]
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_interrupted() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, returning early with `Err(Interrupted)` when
    /// interrupted
    ///
    /// Parks the calling thread; the interrupt unparks the attached worker, so
    /// wake-up is prompt only when called from the worker itself.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let Some(end) = Instant::now().checked_add(duration) else {
            loop {
                self.check()?;
                thread::park();
            }
        };

        loop {
            self.check()?;
            let now = Instant::now();
            if now >= end {
                return Ok(());
            }
            thread::park_timeout(end - now);
        }
    }

    /// Register an operation-specific cancellation action
    ///
    /// The hook runs at most once, on the interrupting thread, so it must be
    /// quick (e.g. shutting down a socket). If an interrupt was already
    /// requested the hook runs immediately on the calling thread. Hooks that
    /// have not run are dropped when the worker finishes.
    pub fn on_interrupt<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.state.register_hook(Box::new(hook));
    }
}

impl fmt::Debug for InterruptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptToken")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<InterruptToken>> = const { RefCell::new(None) };
}

/// Installs the worker's token as the thread's current token for its lifetime
pub(crate) struct CurrentTokenGuard {
    _private: (),
}

impl CurrentTokenGuard {
    pub(crate) fn enter(token: InterruptToken) -> Self {
        CURRENT.with(|current| *current.borrow_mut() = Some(token));
        Self { _private: () }
    }
}

impl Drop for CurrentTokenGuard {
    fn drop(&mut self) {
        let _ = CURRENT.try_with(|current| current.borrow_mut().take());
    }
}

/// Token of the operation running on this thread, if any
pub fn current() -> Option<InterruptToken> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Whether the operation running on this thread has been interrupted
///
/// Always `false` outside a deadline worker.
pub fn is_interrupted() -> bool {
    CURRENT.with(|current| {
        current
            .borrow()
            .as_ref()
            .is_some_and(InterruptToken::is_interrupted)
    })
}

/// Interruptible sleep; a plain sleep outside a deadline worker
pub fn sleep(duration: Duration) -> Result<(), Interrupted> {
    match current() {
        Some(token) => token.sleep(duration),
        None => {
            thread::sleep(duration);
            Ok(())
        }
    }
}
