/*!
 * Disruptions
 *
 * What happens when a trigger fires: an injected delay or an injected
 * failure. Delays sleep through `interrupt::sleep`, so a delay injected into
 * an operation running under a deadline ends as soon as the deadline
 * interrupts it.
 */

use super::context::DisruptionContext;
use crate::core::errors::DisruptionError;
use crate::interrupt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type MessageFactory = Arc<dyn Fn(&DisruptionContext) -> String + Send + Sync>;

#[derive(Clone)]
pub enum Disruption {
    /// Sleep before (or after) the operation
    Delay(Duration),
    /// Abort with `DisruptionError::Injected`
    Fail(MessageFactory),
}

impl Disruption {
    pub fn delay(duration: Duration) -> Self {
        Self::Delay(duration)
    }

    /// Fail with a fixed message
    pub fn fail(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Fail(Arc::new(move |_| message.clone()))
    }

    /// Fail with a message built from the invocation context
    pub fn fail_with<F>(factory: F) -> Self
    where
        F: Fn(&DisruptionContext) -> String + Send + Sync + 'static,
    {
        Self::Fail(Arc::new(factory))
    }

    pub fn apply(&self, context: &DisruptionContext) -> Result<(), DisruptionError> {
        match self {
            Self::Delay(duration) => {
                debug!(
                    group = context.group(),
                    delay_ms = duration.as_millis() as u64,
                    "Starting injected delay"
                );
                interrupt::sleep(*duration).map_err(|_| DisruptionError::Interrupted {
                    group: context.group().to_string(),
                })
            }
            Self::Fail(factory) => Err(DisruptionError::Injected {
                group: context.group().to_string(),
                message: factory(context),
            }),
        }
    }
}

impl fmt::Debug for Disruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delay(duration) => f.debug_tuple("Delay").field(duration).finish(),
            Self::Fail(_) => f.write_str("Fail(..)"),
        }
    }
}
