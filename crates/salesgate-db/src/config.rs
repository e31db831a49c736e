//! Configuration types for query execution

use salesgate_core::{DatabaseConfig, RetryConfig};
use std::time::Duration;

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included (default: 3)
    pub max_attempts: u32,
    /// Sleep between attempts (default: 1s)
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Timeouts handed to a backend when it opens a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectTimeouts {
    /// Login / connect timeout (default: 30s)
    pub connect: Duration,
    /// Per-statement timeout (default: 60s)
    pub query: Duration,
}

impl Default for ConnectTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            query: Duration::from_secs(60),
        }
    }
}

impl From<&DatabaseConfig> for ConnectTimeouts {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_timeout_secs),
            query: Duration::from_secs(config.query_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_config_defaults() {
        assert_eq!(RetryPolicy::default(), RetryPolicy::from(&RetryConfig::default()));
        assert_eq!(
            ConnectTimeouts::default(),
            ConnectTimeouts::from(&DatabaseConfig::default())
        );
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 0,
            delay_ms: 10,
        });
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_millis(10));
    }
}
