//! Service configuration from the environment.

use anyhow::{bail, Context, Result};
use fpl_client::FplClientConfig;
use session_manager::{Credentials, SessionManagerConfig};

/// Everything the service needs to come up, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Team entry id the bot manages.
    pub team_id: u64,
    pub client: FplClientConfig,
    pub session: SessionManagerConfig,
    pub credentials: Credentials,
}

impl ServiceConfig {
    /// Load from environment variables. `FPL_TEAM_ID` is required, and at
    /// least one credential pair (`FPL_SESSION_ID`/`FPL_CSRF_TOKEN` or
    /// `FPL_USERNAME`/`FPL_PASSWORD`) must be present.
    pub fn load() -> Result<Self> {
        let team_id = std::env::var("FPL_TEAM_ID")
            .context("FPL_TEAM_ID is not set")?
            .parse::<u64>()
            .context("FPL_TEAM_ID is not a number")?;

        let credentials = Credentials {
            username: std::env::var("FPL_USERNAME").ok(),
            password: std::env::var("FPL_PASSWORD").ok(),
            session_token: std::env::var("FPL_SESSION_ID").ok(),
            csrf_token: std::env::var("FPL_CSRF_TOKEN").ok(),
        };
        if !credentials.has_token_pair() && !credentials.has_login_pair() {
            bail!(
                "no usable credentials: set FPL_SESSION_ID/FPL_CSRF_TOKEN \
                 or FPL_USERNAME/FPL_PASSWORD"
            );
        }

        Ok(Self {
            team_id,
            client: FplClientConfig::from_env(),
            session: SessionManagerConfig::from_env(),
            credentials,
        })
    }

    /// The account key sessions are tracked under.
    pub fn account_id(&self) -> String {
        self.team_id.to_string()
    }
}
