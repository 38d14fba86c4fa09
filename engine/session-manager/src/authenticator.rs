//! Seam for the password-based login flow.
//!
//! Obtaining session cookies from a username/password requires driving the
//! provider's login page, which is the job of an external scriptable
//! browser. This crate only defines the capability; deployments inject an
//! implementation.

use crate::error::SessionManagerError;
use async_trait::async_trait;

/// Session material obtained from a successful login.
#[derive(Clone)]
pub struct AuthTokens {
    pub session_id: String,
    pub csrf_token: String,
}

// Redacted so tokens cannot leak through format strings.
impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens").finish_non_exhaustive()
    }
}

/// Exchanges a username/password for session cookies.
#[async_trait]
pub trait CredentialAuthenticator: Send + Sync {
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthTokens, SessionManagerError>;
}
