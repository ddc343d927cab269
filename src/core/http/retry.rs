//! Exponential backoff policy for transient upstream failures.

use std::time::Duration;

use crate::core::config::HttpClientConfig;
use crate::domains::tools::{ToolError, ToolResult};

/// Longest configurable retry delay, one hour.
pub const MAX_DELAY_SECS: f64 = 3600.0;

fn delay_secs(key: &str, secs: f64) -> ToolResult<Duration> {
    if !secs.is_finite() || secs > MAX_DELAY_SECS {
        return Err(ToolError::configuration(format!(
            "{} must be a finite number of seconds up to {}, got {}",
            key, MAX_DELAY_SECS, secs
        )));
    }
    Duration::try_from_secs_f64(secs.max(0.0))
        .map_err(|e| ToolError::configuration(format!("Invalid {}: {}", key, e)))
}

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of transport calls, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Build the policy from the HTTP client section of the configuration.
    ///
    /// Delays must be finite and at most [`MAX_DELAY_SECS`]; negative delays
    /// count as zero.
    pub fn from_config(config: &HttpClientConfig) -> ToolResult<Self> {
        Ok(Self {
            max_attempts: config.max_retries.max(1),
            base_delay: delay_secs("retry_delay_secs", config.retry_delay_secs)?,
            max_delay: delay_secs("max_retry_delay_secs", config.max_retry_delay_secs)?,
        })
    }

    /// A policy that never waits, for tests and local fakes.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the failed attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(31) as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}
