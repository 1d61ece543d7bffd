/*!
 * Fault Injection
 *
 * Delays and failures injected at named call sites, gated by triggers.
 * Useful for exercising deadline handling: an injected delay inside an
 * operation run under a deadline is interrupted when the deadline expires.
 *
 * ```
 * use deadline_guard::disruption::{CountingTrigger, Disruptor};
 * use deadline_guard::DisruptionError;
 *
 * let disruptor = Disruptor::builder()
 *     .with_group("payments", |group| {
 *         group.with_config(|config| config.trigger(CountingTrigger::new(2)).fail("gateway down"))
 *     })
 *     .build();
 *
 * let first: Result<u32, DisruptionError> = disruptor.disrupt("payments", || Ok(1));
 * let second: Result<u32, DisruptionError> = disruptor.disrupt("payments", || Ok(2));
 * assert!(first.is_ok());
 * assert!(second.is_err());
 * ```
 */

mod action;
mod context;
mod disruptor;
mod group;
mod trigger;

pub use action::Disruption;
pub use context::DisruptionContext;
pub use disruptor::{Disruptor, DisruptorBuilder};
pub use group::{
    DisruptionConfig, DisruptionConfigBuilder, DisruptionMode, DisruptorGroup,
    DisruptorGroupBuilder,
};
pub use trigger::{
    AlwaysTrigger, CountingTrigger, DisruptionTrigger, LastingTrigger, LimitingTrigger,
    NeverTrigger, RandomTrigger, TriggerExt,
};
