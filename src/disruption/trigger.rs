/*!
 * Disruption Triggers
 *
 * Decide, per invocation, whether a group's disruptions fire. Triggers are
 * shared across threads and keep their own state behind atomics or a
 * parking_lot mutex.
 */

use super::context::DisruptionContext;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub trait DisruptionTrigger: Send + Sync {
    fn should_trigger(&self, context: &DisruptionContext) -> bool;
}

impl<T: DisruptionTrigger + ?Sized> DisruptionTrigger for Arc<T> {
    fn should_trigger(&self, context: &DisruptionContext) -> bool {
        (**self).should_trigger(context)
    }
}

impl<T: DisruptionTrigger + ?Sized> DisruptionTrigger for Box<T> {
    fn should_trigger(&self, context: &DisruptionContext) -> bool {
        (**self).should_trigger(context)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverTrigger;

impl DisruptionTrigger for NeverTrigger {
    fn should_trigger(&self, _: &DisruptionContext) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrigger;

impl DisruptionTrigger for AlwaysTrigger {
    fn should_trigger(&self, _: &DisruptionContext) -> bool {
        true
    }
}

/// Fires on every `target`-th invocation, then starts counting again
#[derive(Debug)]
pub struct CountingTrigger {
    target: u32,
    count: AtomicU32,
}

impl CountingTrigger {
    /// A target of zero behaves like one
    pub fn new(target: u32) -> Self {
        Self {
            target: target.max(1),
            count: AtomicU32::new(0),
        }
    }
}

impl DisruptionTrigger for CountingTrigger {
    fn should_trigger(&self, _: &DisruptionContext) -> bool {
        let target = self.target;
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(if count + 1 >= target { 0 } else { count + 1 })
            })
            .unwrap_or_default();
        previous + 1 >= target
    }
}

/// Fires with probability `chance`, clamped to `[0, 1]`
#[derive(Debug, Clone, Copy)]
pub struct RandomTrigger {
    chance: f64,
}

impl RandomTrigger {
    pub fn new(chance: f64) -> Self {
        let chance = if chance.is_nan() { 0.0 } else { chance.clamp(0.0, 1.0) };
        Self { chance }
    }

    pub fn chance(&self) -> f64 {
        self.chance
    }
}

impl DisruptionTrigger for RandomTrigger {
    fn should_trigger(&self, _: &DisruptionContext) -> bool {
        rand::thread_rng().gen_bool(self.chance)
    }
}

/// Once the inner trigger fires, stays active for `duration`
pub struct LastingTrigger<T> {
    duration: Duration,
    inner: T,
    active_until: Mutex<Option<Instant>>,
}

impl<T: DisruptionTrigger> LastingTrigger<T> {
    pub fn new(duration: Duration, inner: T) -> Self {
        Self {
            duration,
            inner,
            active_until: Mutex::new(None),
        }
    }
}

impl<T: DisruptionTrigger> DisruptionTrigger for LastingTrigger<T> {
    fn should_trigger(&self, context: &DisruptionContext) -> bool {
        let mut active_until = self.active_until.lock();
        let now = Instant::now();
        if active_until.is_some_and(|end| now < end) {
            return true;
        }
        if !self.inner.should_trigger(context) {
            return false;
        }

        let end = now.checked_add(self.duration);
        *active_until = end;
        info!(
            group = context.group(),
            duration_ms = self.duration.as_millis() as u64,
            "Lasting disruption started"
        );
        true
    }
}

struct LimitWindow {
    resets_at: Option<Instant>,
    count: u32,
}

/// Lets the inner trigger fire at most `limit` times per `period`
pub struct LimitingTrigger<T> {
    limit: u32,
    period: Duration,
    inner: T,
    window: Mutex<LimitWindow>,
}

impl<T: DisruptionTrigger> LimitingTrigger<T> {
    pub fn new(limit: u32, period: Duration, inner: T) -> Self {
        Self {
            limit,
            period,
            inner,
            window: Mutex::new(LimitWindow {
                resets_at: None,
                count: 0,
            }),
        }
    }
}

impl<T: DisruptionTrigger> DisruptionTrigger for LimitingTrigger<T> {
    fn should_trigger(&self, context: &DisruptionContext) -> bool {
        let mut window = self.window.lock();
        let now = Instant::now();
        if window.resets_at.map_or(true, |reset| now >= reset) {
            window.resets_at = now.checked_add(self.period);
            window.count = 0;
        }

        if window.count >= self.limit {
            return false;
        }

        let fired = self.inner.should_trigger(context);
        if fired {
            window.count += 1;
            if window.count >= self.limit {
                info!(
                    group = context.group(),
                    limit = self.limit,
                    period_ms = self.period.as_millis() as u64,
                    "Disruption limit reached for this period"
                );
            }
        }
        fired
    }
}

/// Combinators available on every trigger
pub trait TriggerExt: DisruptionTrigger + Sized {
    fn lasting(self, duration: Duration) -> LastingTrigger<Self> {
        LastingTrigger::new(duration, self)
    }

    fn limiting(self, limit: u32, period: Duration) -> LimitingTrigger<Self> {
        LimitingTrigger::new(limit, period, self)
    }
}

impl<T: DisruptionTrigger + Sized> TriggerExt for T {}
