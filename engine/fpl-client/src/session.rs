//! Session seam between the request layer and the session manager.

use crate::error::FplClientError;
use async_trait::async_trait;

/// Decrypted session material for one authenticated request, valid only for
/// the in-memory scope it is handed to. Never logged.
#[derive(Clone)]
pub struct AuthSession {
    pub session_id: String,
    pub csrf_token: String,
}

impl AuthSession {
    /// Headers the upstream requires on authenticated calls: the session
    /// cookie pair, the CSRF header, and a same-site referer.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "Cookie".to_string(),
                format!("sessionid={}; csrftoken={}", self.session_id, self.csrf_token),
            ),
            ("X-CSRFToken".to_string(), self.csrf_token.clone()),
            ("Referer".to_string(), "https://fantasy.premierleague.com/".to_string()),
        ]
    }
}

// Debug is manual so token material cannot leak through format strings.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession").finish_non_exhaustive()
    }
}

/// Supplies valid session material on demand, renewing as needed.
///
/// Implemented by the session manager; `authenticated_session` is expected
/// to be safe under concurrent callers (single-flight per account).
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Return a currently valid session, authenticating or refreshing first
    /// if required.
    async fn authenticated_session(&self) -> Result<AuthSession, FplClientError>;

    /// Drop the current session so the next call re-authenticates. Invoked
    /// by the request layer after an upstream 401.
    async fn invalidate(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_cookie_and_csrf() {
        let session = AuthSession {
            session_id: "sid123".to_string(),
            csrf_token: "csrf456".to_string(),
        };
        let headers = session.headers();
        assert_eq!(headers[0].0, "Cookie");
        assert_eq!(headers[0].1, "sessionid=sid123; csrftoken=csrf456");
        assert_eq!(headers[1], ("X-CSRFToken".to_string(), "csrf456".to_string()));
        assert_eq!(headers[2].0, "Referer");
    }

    #[test]
    fn debug_does_not_leak_tokens() {
        let session = AuthSession {
            session_id: "secret-sid".to_string(),
            csrf_token: "secret-csrf".to_string(),
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-sid"));
        assert!(!rendered.contains("secret-csrf"));
    }
}
