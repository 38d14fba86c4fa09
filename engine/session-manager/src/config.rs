//! Configuration for the session manager

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for [`crate::SessionManager`] and its renewal scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManagerConfig {
    /// Upstream API root used for the session validity probe.
    pub base_url: String,

    /// How long a freshly minted session is assumed to live.
    pub session_lifetime: Duration,

    /// Renew when less than this much lifetime remains.
    pub renewal_window: Duration,

    /// Consecutive authentication failures before the account is disabled.
    pub max_consecutive_failures: u32,

    /// Wake interval of the proactive renewal scheduler.
    pub refresh_interval: Duration,

    /// File holding the at-rest encryption key (owner-only permissions).
    pub key_file: PathBuf,

    /// File holding encrypted session material per account.
    pub state_file: PathBuf,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fantasy.premierleague.com/api".to_string(),
            session_lifetime: Duration::from_secs(3600),
            renewal_window: Duration::from_secs(300),
            max_consecutive_failures: 3,
            refresh_interval: Duration::from_secs(60),
            key_file: PathBuf::from(".session_key"),
            state_file: PathBuf::from(".sessions.json"),
        }
    }
}

impl SessionManagerConfig {
    /// Load defaults with environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("FPL_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = env_u64("FPL_SESSION_LIFETIME_SECS") {
            config.session_lifetime = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("FPL_RENEWAL_WINDOW_SECS") {
            config.renewal_window = Duration::from_secs(secs);
        }
        if let Some(max) = env_u64("FPL_MAX_AUTH_FAILURES") {
            config.max_consecutive_failures = max as u32;
        }
        if let Some(secs) = env_u64("FPL_REFRESH_INTERVAL_SECS") {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("FPL_SESSION_KEY_FILE") {
            config.key_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("FPL_SESSION_STATE_FILE") {
            config.state_file = PathBuf::from(path);
        }

        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
