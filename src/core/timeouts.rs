/*!
 * Route Timeout Table
 *
 * Per-route (per-endpoint) timeouts supplied by collaborators that wrap
 * their blocking calls with a deadline. Values arrive as signed
 * milliseconds and are validated before anything runs.
 */

use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Reject zero timeouts
#[inline]
pub fn validate_timeout(timeout: Duration) -> Result<Duration, ConfigError> {
    if timeout.is_zero() {
        return Err(ConfigError::NonPositiveTimeout { millis: 0 });
    }
    Ok(timeout)
}

/// Convert a signed millisecond timeout, rejecting zero and negative values
#[inline]
pub fn timeout_from_millis(millis: i64) -> Result<Duration, ConfigError> {
    if millis <= 0 {
        return Err(ConfigError::NonPositiveTimeout { millis });
    }
    Ok(Duration::from_millis(millis as u64))
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawTimeoutTable {
    #[serde(default)]
    default_ms: Option<i64>,
    #[serde(default)]
    routes: HashMap<String, i64>,
}

/// Validated route -> timeout mapping with an optional fallback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutTable {
    default: Option<Duration>,
    routes: HashMap<String, Duration>,
}

impl TimeoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback timeout
    pub fn with_default(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        self.default = Some(validate_timeout(timeout)?);
        Ok(self)
    }

    /// Set the timeout for a route
    pub fn with_route(
        mut self,
        route: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        self.routes.insert(route.into(), validate_timeout(timeout)?);
        Ok(self)
    }

    /// Parse `{ "default_ms": 1000, "routes": { "users.get": 250 } }`
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawTimeoutTable =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let default = raw.default_ms.map(timeout_from_millis).transpose()?;
        let routes = raw
            .routes
            .into_iter()
            .map(|(route, millis)| timeout_from_millis(millis).map(|d| (route, d)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { default, routes })
    }

    /// Timeout for a route, falling back to the default
    pub fn timeout_for(&self, route: &str) -> Result<Duration, ConfigError> {
        self.routes
            .get(route)
            .copied()
            .or(self.default)
            .ok_or_else(|| ConfigError::MissingTimeout(route.to_string()))
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
