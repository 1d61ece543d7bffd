/*!
 * Disruption Context
 */

/// Per-invocation information handed to triggers and disruptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisruptionContext {
    group: String,
}

impl DisruptionContext {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
        }
    }

    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }
}
