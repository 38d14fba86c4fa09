//! Configuration for the request layer

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`crate::FplClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FplClientConfig {
    /// Upstream API root, no trailing slash.
    pub base_url: String,

    /// Per-request timeout applied by the transport.
    pub request_timeout: Duration,

    /// TTL for the bootstrap-static payload (changes rarely).
    pub bootstrap_ttl: Duration,

    /// TTL for the fixtures list (changes around kickoff).
    pub fixtures_ttl: Duration,

    /// Backoff schedule for reads.
    pub retry: RetryPolicy,

    /// Backoff schedule for the transfer-submission POST.
    pub transfer_retry: RetryPolicy,
}

impl Default for FplClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fantasy.premierleague.com/api".to_string(),
            request_timeout: Duration::from_secs(30),
            bootstrap_ttl: Duration::from_secs(300),
            fixtures_ttl: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            transfer_retry: RetryPolicy::for_transfers(),
        }
    }
}

impl FplClientConfig {
    /// Load defaults with environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("FPL_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = env_u64("FPL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("FPL_BOOTSTRAP_TTL_SECS") {
            config.bootstrap_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("FPL_FIXTURES_TTL_SECS") {
            config.fixtures_ttl = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_u64("FPL_MAX_RETRIES") {
            config.retry.max_attempts = attempts as u32;
        }

        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_contract() {
        let config = FplClientConfig::default();
        assert_eq!(config.base_url, "https://fantasy.premierleague.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.transfer_retry.max_attempts, 3);
        assert!(config.bootstrap_ttl > config.fixtures_ttl);
    }
}
