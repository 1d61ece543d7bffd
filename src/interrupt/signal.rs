/*!
 * Wake-up Signals (unix)
 *
 * Delivers a signal to a specific worker thread so that a blocking syscall
 * returns `EINTR`. The handler is a no-op installed without `SA_RESTART`.
 * Only `SIGUSR1` and `SIGUSR2` are accepted; anything else would clash with
 * signals the host application relies on.
 *
 * Note that `std` helpers such as `read_exact` retry on `EINTR`; a wake-up
 * signal only helps operations that surface `ErrorKind::Interrupted`.
 */

use crate::core::errors::ConfigError;

/// A signal installed for waking interrupted workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeupSignal {
    #[cfg(unix)]
    signal: nix::sys::signal::Signal,
}

impl WakeupSignal {
    /// Parse a signal name and install its no-op handler (once per process)
    pub fn install(name: &str) -> Result<Self, ConfigError> {
        imp::install(name)
    }

    /// Signal name as configured
    pub fn name(&self) -> &'static str {
        imp::name(self)
    }
}

#[cfg(unix)]
pub(crate) use imp::ThreadTarget;

#[cfg(unix)]
mod imp {
    use super::WakeupSignal;
    use crate::core::errors::ConfigError;
    use nix::sys::pthread::{pthread_kill, pthread_self, Pthread};
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use parking_lot::Mutex;
    use tracing::info;

    static INSTALLED: Mutex<Vec<Signal>> = parking_lot::const_mutex(Vec::new());

    extern "C" fn on_wakeup(_: nix::libc::c_int) {}

    fn parse(name: &str) -> Result<Signal, ConfigError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SIGUSR1" | "USR1" => Ok(Signal::SIGUSR1),
            "SIGUSR2" | "USR2" => Ok(Signal::SIGUSR2),
            _ => Err(ConfigError::UnsupportedSignal(name.to_string())),
        }
    }

    pub(super) fn install(name: &str) -> Result<WakeupSignal, ConfigError> {
        let signal = parse(name)?;
        let mut installed = INSTALLED.lock();
        if !installed.contains(&signal) {
            let action = SigAction::new(
                SigHandler::Handler(on_wakeup),
                SaFlags::empty(),
                SigSet::empty(),
            );
            // SAFETY: the handler does nothing, so it is async-signal-safe.
            unsafe { sigaction(signal, &action) }
                .map_err(|e| ConfigError::Startup(format!("sigaction({}): {}", signal, e)))?;
            installed.push(signal);
            info!(signal = %signal, "Installed worker wake-up signal handler");
        }
        Ok(WakeupSignal { signal })
    }

    pub(super) fn name(signal: &WakeupSignal) -> &'static str {
        signal.signal.as_str()
    }

    /// pthread id of a worker, valid only while the worker is attached
    #[derive(Debug, Clone, Copy)]
    pub(crate) struct ThreadTarget(Pthread);

    // SAFETY: the id is an opaque handle; it is only passed to pthread_kill
    // while the owning worker holds its attachment (see InterruptState).
    unsafe impl Send for ThreadTarget {}

    impl ThreadTarget {
        pub(crate) fn current() -> Self {
            Self(pthread_self())
        }

        pub(crate) fn deliver(self, signal: WakeupSignal) -> nix::Result<()> {
            pthread_kill(self.0, signal.signal)
        }
    }

}

#[cfg(not(unix))]
mod imp {
    use super::WakeupSignal;
    use crate::core::errors::ConfigError;

    pub(super) fn install(name: &str) -> Result<WakeupSignal, ConfigError> {
        Err(ConfigError::UnsupportedSignal(name.to_string()))
    }

    pub(super) fn name(_: &WakeupSignal) -> &'static str {
        "none"
    }
}
