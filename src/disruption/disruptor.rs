/*!
 * Disruptor
 *
 * Wraps operations at named call sites and injects the disruptions
 * configured for that site. Unknown groups pass through untouched.
 */

use super::context::DisruptionContext;
use super::group::{DisruptionMode, DisruptorGroup, DisruptorGroupBuilder};
use crate::core::errors::DisruptionError;
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Disruptor {
    groups: Arc<HashMap<String, DisruptorGroup, RandomState>>,
}

impl Disruptor {
    pub fn builder() -> DisruptorBuilder {
        DisruptorBuilder::default()
    }

    /// Disruptor with no groups; every call passes through
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &str) -> Option<&DisruptorGroup> {
        self.groups.get(name)
    }

    /// Run `operation` with the `group` disruptions around it
    ///
    /// `Before` disruptions run first, then the operation, then `After`
    /// disruptions. The first disruption error aborts the call; an operation
    /// error skips the `After` disruptions.
    pub fn disrupt<T, E, F>(&self, group: &str, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<DisruptionError>,
    {
        let Some(disruptor_group) = self.group(group) else {
            return operation();
        };
        let context = DisruptionContext::new(group);

        apply(disruptor_group, DisruptionMode::Before, &context)?;
        let value = operation()?;
        apply(disruptor_group, DisruptionMode::After, &context)?;
        Ok(value)
    }

    /// [`disrupt`](Self::disrupt) for operations that cannot fail
    pub fn disrupt_without_result<F>(
        &self,
        group: &str,
        operation: F,
    ) -> Result<(), DisruptionError>
    where
        F: FnOnce(),
    {
        self.disrupt(group, || {
            operation();
            Ok(())
        })
    }

    /// Run only the `mode` disruptions of `group`
    ///
    /// For call sites that cannot hand the call over as a closure, such as
    /// client interceptors with separate request and response hooks. Call it
    /// with `Before` ahead of the call and `After` once it returned.
    pub fn disrupt_phase(&self, group: &str, mode: DisruptionMode) -> Result<(), DisruptionError> {
        match self.group(group) {
            Some(disruptor_group) => apply(disruptor_group, mode, &DisruptionContext::new(group)),
            None => Ok(()),
        }
    }
}

fn apply(
    group: &DisruptorGroup,
    mode: DisruptionMode,
    context: &DisruptionContext,
) -> Result<(), DisruptionError> {
    for config in group.firing(mode, context) {
        for disruption in config.disruptions() {
            disruption.apply(context)?;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct DisruptorBuilder {
    groups: HashMap<String, DisruptorGroup, RandomState>,
}

impl DisruptorBuilder {
    /// Add (or replace) the group for a call site
    pub fn group(mut self, name: impl Into<String>, group: DisruptorGroup) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    /// Add a group built in place
    pub fn with_group(
        self,
        name: impl Into<String>,
        build: impl FnOnce(DisruptorGroupBuilder) -> DisruptorGroupBuilder,
    ) -> Self {
        self.group(name, build(DisruptorGroup::builder()).build())
    }

    pub fn build(self) -> Disruptor {
        Disruptor {
            groups: Arc::new(self.groups),
        }
    }
}
