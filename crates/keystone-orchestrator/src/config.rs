use keystone_core::{KeystoneError, KeystoneResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Retry behaviour for transient agent failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential backoff).
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    8_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
        }
    }

    /// Delay before retry number `attempt + 1`, capped at `backoff_max_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self
            .backoff_base_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.backoff_max_ms))
    }
}

/// Settings for the scheduler, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum agents in flight at once, shared by all concurrent requests.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    /// Budget for one agent, retries and backoff included.
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,
    /// Optional wall-clock budget for the whole request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: Option<u64>,
    /// Retry behaviour for transient agent failures.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_concurrency_limit() -> usize {
    4
}

fn default_agent_timeout_secs() -> u64 {
    180
}

fn default_request_timeout_secs() -> Option<u64> {
    Some(900)
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            agent_timeout_secs: default_agent_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Reject settings the scheduler cannot honour.
    pub fn validate(&self) -> KeystoneResult<()> {
        if self.concurrency_limit == 0 {
            return Err(KeystoneError::Config(
                "orchestrator.concurrency_limit must be at least 1".into(),
            ));
        }
        if self.concurrency_limit > Semaphore::MAX_PERMITS {
            return Err(KeystoneError::Config(format!(
                "orchestrator.concurrency_limit must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.agent_timeout_secs == 0 {
            return Err(KeystoneError::Config(
                "orchestrator.agent_timeout_secs must be positive".into(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(KeystoneError::Config(
                "orchestrator.request_timeout_secs must be positive when set".into(),
            ));
        }
        if let Some(secs) = self.request_timeout_secs {
            if Instant::now().checked_add(Duration::from_secs(secs)).is_none() {
                return Err(KeystoneError::Config(
                    "orchestrator.request_timeout_secs is too large".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn backoff_computation() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(4), Duration::from_millis(8_000));
        assert_eq!(policy.backoff(10), Duration::from_millis(8_000));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_millis(8_000));
    }

    #[test]
    fn defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.concurrency_limit, 4);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.request_timeout_secs, Some(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = OrchestratorConfig {
            concurrency_limit: 0,
            ..OrchestratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(KeystoneError::Config(_))));
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let config = OrchestratorConfig {
            request_timeout_secs: Some(0),
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_concurrency_is_rejected() {
        let config = OrchestratorConfig {
            concurrency_limit: usize::MAX,
            ..OrchestratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency_limit must be at most"));

        let config = OrchestratorConfig {
            concurrency_limit: Semaphore::MAX_PERMITS,
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unrepresentable_request_timeout_is_rejected() {
        let config = OrchestratorConfig {
            request_timeout_secs: Some(u64::MAX),
            ..OrchestratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs is too large"));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: OrchestratorConfig = serde_json::from_value(serde_json::json!({
            "concurrency_limit": 3,
            "retry": { "max_retries": 1 }
        }))
        .unwrap();
        assert_eq!(config.concurrency_limit, 3);
        assert_eq!(config.agent_timeout_secs, 180);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.backoff_base_ms, 500);
    }
}
