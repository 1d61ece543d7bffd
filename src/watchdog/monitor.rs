/*!
 * Watchdog Thread
 *
 * One background thread per executor detects expired deadlines, resolves
 * them as timed out and interrupts their workers. It never waits for a
 * worker: losing the resolve race means the worker (or a canceller) got
 * there first, and nothing else happens.
 *
 * Heap mode sleeps until the soonest queued deadline, capped by the poll
 * interval, and is woken early when a registration becomes the new head.
 * Poll mode scans the registry every poll interval.
 */

use super::queue::DeadlineQueue;
use crate::core::config::{DeadlineConfig, WatchdogMode};
use crate::core::limits::WATCHDOG_THREAD_NAME;
use crate::core::types::{DeadlineId, OutcomeKind};
use crate::deadline::ExecutionRegistry;
use crate::monitoring::DeadlineSpan;
use crate::worker::WorkerDispatch;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Resolve `id` as timed out or cancelled and interrupt its worker
///
/// Returns `true` only when this call won the record.
pub(crate) fn terminate(
    registry: &ExecutionRegistry,
    id: DeadlineId,
    outcome: OutcomeKind,
    source: &'static str,
) -> bool {
    debug_assert!(!outcome.is_worker_outcome());
    let Some(record) = registry.resolve_record(id, outcome) else {
        return false;
    };

    if outcome == OutcomeKind::TimedOut {
        DeadlineSpan::timed_out(id, record.elapsed(), record.timeout(), source);
    } else {
        info!(id = %id, source, "operation cancelled");
    }

    if WorkerDispatch::request_interrupt(record.worker()) {
        registry.stats().inc_interrupts_sent();
    }
    true
}

struct WatchState {
    queue: DeadlineQueue,
    running: bool,
}

struct Shared {
    registry: Arc<ExecutionRegistry>,
    mode: WatchdogMode,
    poll_interval: Duration,
    state: Mutex<WatchState>,
    wake: Condvar,
}

impl Shared {
    fn expire_all(&self, ids: Vec<DeadlineId>) -> usize {
        ids.into_iter()
            .filter(|&id| terminate(&self.registry, id, OutcomeKind::TimedOut, "watchdog"))
            .count()
    }

    fn scan_registry(&self, now: Instant) -> usize {
        let ids = self.registry.expired(now).iter().map(|record| record.id()).collect();
        self.expire_all(ids)
    }

    fn next_wake(&self, queue: &DeadlineQueue) -> Instant {
        let now = Instant::now();
        let cap = now
            .checked_add(self.poll_interval)
            .unwrap_or(now + Duration::from_secs(1));
        match self.mode {
            WatchdogMode::Heap => queue.next_deadline().map_or(cap, |next| next.min(cap)),
            WatchdogMode::Poll => cap,
        }
    }
}

fn run(shared: Arc<Shared>) {
    debug!(mode = ?shared.mode, "Watchdog started");
    let mut state = shared.state.lock();

    while state.running {
        let now = Instant::now();
        let fired = match shared.mode {
            WatchdogMode::Heap => {
                let due = state.queue.pop_expired(now);
                if due.is_empty() {
                    0
                } else {
                    MutexGuard::unlocked(&mut state, || shared.expire_all(due))
                }
            }
            WatchdogMode::Poll => MutexGuard::unlocked(&mut state, || shared.scan_registry(now)),
        };

        if shared.mode == WatchdogMode::Heap {
            let registry = &shared.registry;
            let pruned = state.queue.prune(registry.len(), |id| registry.contains(id));
            if pruned > 0 {
                debug!(pruned, remaining = state.queue.len(), "Pruned stale deadline entries");
            }
        }

        if fired > 0 {
            debug!(fired, "Watchdog expired deadlines");
        }

        if !state.running {
            break;
        }
        let wake_at = shared.next_wake(&state.queue);
        shared.wake.wait_until(&mut state, wake_at);
    }

    debug!("Watchdog stopped");
}

/// Background deadline monitor
pub struct Watchdog {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    /// Spawn the watchdog thread for `registry`
    pub fn start(registry: Arc<ExecutionRegistry>, config: &DeadlineConfig) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            registry,
            mode: config.watchdog,
            poll_interval: config.poll_interval,
            state: Mutex::new(WatchState {
                queue: DeadlineQueue::new(),
                running: true,
            }),
            wake: Condvar::new(),
        });

        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(WATCHDOG_THREAD_NAME.to_string())
                .spawn(move || run(shared))?
        };

        Ok(Self {
            shared,
            thread: Mutex::new(Some(thread)),
        })
    }

    #[inline]
    pub fn mode(&self) -> WatchdogMode {
        self.shared.mode
    }

    /// Track a newly registered deadline
    ///
    /// Heap mode wakes the thread when the deadline is the new soonest one.
    /// Poll mode discovers records through the registry and ignores this.
    pub fn schedule(&self, id: DeadlineId, deadline: Instant) {
        if self.shared.mode != WatchdogMode::Heap {
            return;
        }
        let mut state = self.shared.state.lock();
        if !state.running {
            return;
        }
        if state.queue.push(id, deadline) {
            self.shared.wake.notify_one();
        }
    }

    /// One synchronous pass over the registry, expiring everything due at
    /// `now`. Returns the number of records this pass timed out.
    pub fn scan(&self, now: Instant) -> usize {
        self.shared.scan_registry(now)
    }

    /// Deadlines currently queued (heap mode), stale entries included
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Stop and join the watchdog thread; idempotent
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.running {
                return;
            }
            state.running = false;
            state.queue.clear();
            self.shared.wake.notify_all();
        }

        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                warn!("Watchdog thread panicked before shutdown");
            }
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}
