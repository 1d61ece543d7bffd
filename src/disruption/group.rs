/*!
 * Disruption Configurations and Groups
 */

use super::action::Disruption;
use super::context::DisruptionContext;
use super::trigger::{DisruptionTrigger, NeverTrigger};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Whether disruptions run before or after the wrapped operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionMode {
    #[default]
    Before,
    After,
}

/// A trigger and the disruptions it releases
#[derive(Clone)]
pub struct DisruptionConfig {
    mode: DisruptionMode,
    trigger: Arc<dyn DisruptionTrigger>,
    disruptions: Vec<Disruption>,
}

impl DisruptionConfig {
    pub fn builder() -> DisruptionConfigBuilder {
        DisruptionConfigBuilder::default()
    }

    #[inline]
    pub fn mode(&self) -> DisruptionMode {
        self.mode
    }

    pub fn trigger(&self) -> &dyn DisruptionTrigger {
        self.trigger.as_ref()
    }

    pub fn disruptions(&self) -> &[Disruption] {
        &self.disruptions
    }
}

impl fmt::Debug for DisruptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisruptionConfig")
            .field("mode", &self.mode)
            .field("disruptions", &self.disruptions)
            .finish_non_exhaustive()
    }
}

/// Defaults: mode `Before`, a trigger that never fires, no disruptions
pub struct DisruptionConfigBuilder {
    mode: DisruptionMode,
    trigger: Arc<dyn DisruptionTrigger>,
    disruptions: Vec<Disruption>,
}

impl Default for DisruptionConfigBuilder {
    fn default() -> Self {
        Self {
            mode: DisruptionMode::Before,
            trigger: Arc::new(NeverTrigger),
            disruptions: Vec::new(),
        }
    }
}

impl DisruptionConfigBuilder {
    pub fn mode(mut self, mode: DisruptionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn trigger(mut self, trigger: impl DisruptionTrigger + 'static) -> Self {
        self.trigger = Arc::new(trigger);
        self
    }

    pub fn disruption(mut self, disruption: Disruption) -> Self {
        self.disruptions.push(disruption);
        self
    }

    pub fn disruptions(mut self, disruptions: impl IntoIterator<Item = Disruption>) -> Self {
        self.disruptions.extend(disruptions);
        self
    }

    pub fn delay(self, duration: Duration) -> Self {
        self.disruption(Disruption::delay(duration))
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.disruption(Disruption::fail(message))
    }

    pub fn build(self) -> DisruptionConfig {
        DisruptionConfig {
            mode: self.mode,
            trigger: self.trigger,
            disruptions: self.disruptions,
        }
    }
}

/// Ordered configurations applied to one named call site
#[derive(Debug, Clone, Default)]
pub struct DisruptorGroup {
    configs: Vec<DisruptionConfig>,
}

impl DisruptorGroup {
    pub fn builder() -> DisruptorGroupBuilder {
        DisruptorGroupBuilder::default()
    }

    pub fn configs(&self) -> &[DisruptionConfig] {
        &self.configs
    }

    /// Configs for `mode` whose trigger fires for this invocation, in order
    pub(super) fn firing<'a>(
        &'a self,
        mode: DisruptionMode,
        context: &'a DisruptionContext,
    ) -> impl Iterator<Item = &'a DisruptionConfig> + 'a {
        self.configs
            .iter()
            .filter(move |config| config.mode == mode)
            .filter(move |config| config.trigger.should_trigger(context))
    }
}

#[derive(Default)]
pub struct DisruptorGroupBuilder {
    configs: Vec<DisruptionConfig>,
}

impl DisruptorGroupBuilder {
    pub fn config(mut self, config: DisruptionConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Add a config built in place
    pub fn with_config(
        self,
        build: impl FnOnce(DisruptionConfigBuilder) -> DisruptionConfigBuilder,
    ) -> Self {
        self.config(build(DisruptionConfig::builder()).build())
    }

    pub fn build(self) -> DisruptorGroup {
        DisruptorGroup {
            configs: self.configs,
        }
    }
}
