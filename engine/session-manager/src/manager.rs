//! Per-account session lifecycle: authenticate, probe, renew, disable.

use crate::authenticator::{AuthTokens, CredentialAuthenticator};
use crate::config::SessionManagerConfig;
use crate::crypto::TokenCipher;
use crate::error::SessionManagerError;
use crate::store::{SessionStore, StoredSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fpl_client::{
    AuthSession, FplClientError, HttpTransport, Method, PreparedRequest, SessionProvider,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Credentials configured for one account. Exactly one of the token pair
/// or the username/password pair must be present for authentication to
/// succeed; the token pair takes precedence when both are set.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_token: Option<String>,
    pub csrf_token: Option<String>,
}

impl Credentials {
    pub fn from_tokens(session_token: impl Into<String>, csrf_token: impl Into<String>) -> Self {
        Self {
            session_token: Some(session_token.into()),
            csrf_token: Some(csrf_token.into()),
            ..Self::default()
        }
    }

    pub fn from_login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn has_token_pair(&self) -> bool {
        self.session_token.is_some() && self.csrf_token.is_some()
    }

    pub fn has_login_pair(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

// Redacted so secrets cannot leak through format strings.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("has_token_pair", &self.has_token_pair())
            .field("has_login_pair", &self.has_login_pair())
            .finish()
    }
}

/// Mutable per-account session state, guarded by the entry mutex.
#[derive(Default)]
struct SessionState {
    tokens: Option<AuthTokens>,
    created_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    consecutive_failures: u32,
    /// Set once the configured static token pair has been rejected
    /// upstream, so renewal falls through to the password flow.
    static_tokens_stale: bool,
}

struct AccountEntry {
    credentials: Credentials,
    state: tokio::sync::Mutex<SessionState>,
}

/// Monitoring snapshot for one account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatus {
    pub registered: bool,
    pub authenticated: bool,
    pub expiring_soon: bool,
    pub consecutive_failures: u32,
    pub disabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Owns authentication material for every tracked account.
///
/// All mutation of an account's session goes through that account's state
/// mutex, so concurrent `ensure_authenticated` callers are single-flight:
/// one performs the renewal, the rest block on its result.
pub struct SessionManager {
    config: SessionManagerConfig,
    cipher: TokenCipher,
    store: SessionStore,
    transport: Arc<dyn HttpTransport>,
    authenticator: Option<Arc<dyn CredentialAuthenticator>>,
    accounts: DashMap<String, Arc<AccountEntry>>,
}

impl SessionManager {
    pub fn new(
        config: SessionManagerConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> crate::Result<Self> {
        let cipher = TokenCipher::load_or_create(&config.key_file)?;
        let store = SessionStore::open(config.state_file.clone())?;
        Ok(Self {
            config,
            cipher,
            store,
            transport,
            authenticator: None,
            accounts: DashMap::new(),
        })
    }

    /// Attach the password-login seam (an external headless browser).
    pub fn with_authenticator(mut self, authenticator: Arc<dyn CredentialAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Track an account, restoring any persisted session material for it.
    pub fn register_account(&self, account_id: &str, credentials: Credentials) {
        let mut state = SessionState::default();
        if let Some(stored) = self.store.get(account_id) {
            match (
                self.cipher.decrypt(&stored.encrypted_session_token),
                self.cipher.decrypt(&stored.encrypted_csrf_token),
            ) {
                (Ok(session_id), Ok(csrf_token)) => {
                    state.tokens = Some(AuthTokens { session_id, csrf_token });
                    state.created_at = Some(stored.created_at);
                    state.expires_at = Some(stored.expires_at);
                    state.consecutive_failures = stored.consecutive_failures;
                    info!(account = %mask_account(account_id), "restored persisted session");
                }
                _ => {
                    warn!(
                        account = %mask_account(account_id),
                        "persisted session undecryptable, discarding"
                    );
                    let _ = self.store.remove(account_id);
                }
            }
        }
        self.accounts.insert(
            account_id.to_string(),
            Arc::new(AccountEntry { credentials, state: tokio::sync::Mutex::new(state) }),
        );
    }

    pub fn tracked_accounts(&self) -> Vec<String> {
        self.accounts.iter().map(|e| e.key().clone()).collect()
    }

    fn entry(&self, account_id: &str) -> crate::Result<Arc<AccountEntry>> {
        self.accounts
            .get(account_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| SessionManagerError::UnknownAccount {
                account_id: account_id.to_string(),
            })
    }

    /// Return a valid session, authenticating or renewing first when the
    /// session is absent, near expiry, or rejected by the upstream probe.
    /// Disabled accounts fail immediately with no network I/O.
    pub async fn ensure_authenticated(&self, account_id: &str) -> crate::Result<AuthSession> {
        let entry = self.entry(account_id)?;
        let mut state = entry.state.lock().await;

        if state.consecutive_failures >= self.config.max_consecutive_failures {
            return Err(SessionManagerError::AccountDisabled {
                account_id: account_id.to_string(),
                failures: state.consecutive_failures,
            });
        }

        let needs_auth = match state.tokens.clone() {
            None => true,
            Some(tokens) => {
                let expiring = self.expiring_soon_locked(&state);
                if expiring {
                    true
                } else if self.probe(account_id, &tokens).await {
                    // Upstream accepted the session again, so any earlier
                    // rejection was transient.
                    state.static_tokens_stale = false;
                    false
                } else {
                    // Upstream invalidated the session independent of the
                    // local clock; a configured static token pair is now
                    // known-bad.
                    state.static_tokens_stale = true;
                    true
                }
            }
        };

        if needs_auth {
            self.authenticate_locked(account_id, &entry.credentials, &mut state).await?;
        }

        state
            .tokens
            .as_ref()
            .map(auth_session)
            .ok_or_else(|| SessionManagerError::AuthenticationFailed {
                reason: "no session material after authentication".to_string(),
            })
    }

    /// Force a renewal regardless of the expiry clock (scheduler path).
    pub async fn refresh(&self, account_id: &str) -> crate::Result<AuthSession> {
        let entry = self.entry(account_id)?;
        let mut state = entry.state.lock().await;

        if state.consecutive_failures >= self.config.max_consecutive_failures {
            return Err(SessionManagerError::AccountDisabled {
                account_id: account_id.to_string(),
                failures: state.consecutive_failures,
            });
        }

        self.authenticate_locked(account_id, &entry.credentials, &mut state).await
    }

    /// Drop the current session so the next call re-authenticates.
    pub async fn invalidate(&self, account_id: &str) {
        if let Ok(entry) = self.entry(account_id) {
            let mut state = entry.state.lock().await;
            state.tokens = None;
            state.expires_at = None;
            // Marking the configured pair stale routes the next attempt
            // through the password flow; an account without one has nothing
            // else to mint from, so its pair stays eligible.
            state.static_tokens_stale = entry.credentials.has_login_pair();
            if let Err(e) = self.store.remove(account_id) {
                warn!(error = %e, "failed to remove persisted session");
            }
        }
    }

    /// True when the session is absent or inside the renewal window.
    pub async fn is_expiring_soon(&self, account_id: &str) -> bool {
        match self.entry(account_id) {
            Ok(entry) => {
                let state = entry.state.lock().await;
                self.expiring_soon_locked(&state)
            }
            Err(_) => true,
        }
    }

    /// Probe the upstream with the current session; a non-200 answer means
    /// invalid regardless of the expiry clock.
    pub async fn is_valid(&self, account_id: &str) -> bool {
        match self.entry(account_id) {
            Ok(entry) => {
                let state = entry.state.lock().await;
                match &state.tokens {
                    Some(tokens) => self.probe(account_id, tokens).await,
                    None => false,
                }
            }
            Err(_) => false,
        }
    }

    /// Monitoring snapshot.
    pub async fn session_status(&self, account_id: &str) -> AccountStatus {
        match self.entry(account_id) {
            Ok(entry) => {
                let state = entry.state.lock().await;
                AccountStatus {
                    registered: true,
                    authenticated: state.tokens.is_some(),
                    expiring_soon: self.expiring_soon_locked(&state),
                    consecutive_failures: state.consecutive_failures,
                    disabled: state.consecutive_failures
                        >= self.config.max_consecutive_failures,
                    expires_at: state.expires_at,
                }
            }
            Err(_) => AccountStatus {
                registered: false,
                authenticated: false,
                expiring_soon: true,
                consecutive_failures: 0,
                disabled: false,
                expires_at: None,
            },
        }
    }

    /// Adapter handing the request layer per-account session material.
    pub fn provider_for(self: &Arc<Self>, account_id: &str) -> Arc<dyn SessionProvider> {
        Arc::new(AccountSessionProvider {
            manager: Arc::clone(self),
            account_id: account_id.to_string(),
        })
    }

    fn expiring_soon_locked(&self, state: &SessionState) -> bool {
        match state.expires_at {
            Some(expires_at) => {
                let window = chrono::Duration::seconds(self.config.renewal_window.as_secs() as i64);
                Utc::now() > expires_at - window
            }
            None => true,
        }
    }

    async fn probe(&self, account_id: &str, tokens: &AuthTokens) -> bool {
        let url = format!("{}/entry/{}/", self.config.base_url, account_id);
        let request = PreparedRequest {
            method: Method::Get,
            url,
            headers: auth_session(tokens).headers(),
            body: None,
        };
        match self.transport.send(request).await {
            Ok(response) => response.status == 200,
            Err(e) => {
                warn!(account = %mask_account(account_id), error = %e, "session probe failed");
                false
            }
        }
    }

    /// Perform one authentication attempt with the account lock held,
    /// updating failure accounting and persisted state.
    async fn authenticate_locked(
        &self,
        account_id: &str,
        credentials: &Credentials,
        state: &mut SessionState,
    ) -> crate::Result<AuthSession> {
        let (method, outcome) = if credentials.has_token_pair() && !state.static_tokens_stale {
            // Session-token credentials build an authenticated channel
            // directly; no login round-trip is needed.
            let tokens = AuthTokens {
                session_id: credentials.session_token.clone().unwrap_or_default(),
                csrf_token: credentials.csrf_token.clone().unwrap_or_default(),
            };
            ("session_tokens", Ok(tokens))
        } else if credentials.has_login_pair() {
            let username = credentials.username.as_deref().unwrap_or_default();
            let password = credentials.password.as_deref().unwrap_or_default();
            let outcome = match &self.authenticator {
                Some(authenticator) => authenticator.login(username, password).await,
                None => Err(SessionManagerError::AuthenticationFailed {
                    reason: "no credential authenticator configured".to_string(),
                }),
            };
            ("credentials", outcome)
        } else if credentials.has_token_pair() {
            // Static tokens already rejected upstream and no password
            // fallback exists.
            (
                "session_tokens",
                Err(SessionManagerError::AuthenticationFailed {
                    reason: "configured session tokens rejected upstream".to_string(),
                }),
            )
        } else {
            audit_auth_attempt(account_id, "none", false);
            return Err(SessionManagerError::NoCredentials {
                account_id: account_id.to_string(),
            });
        };

        match outcome {
            Ok(tokens) => {
                let session = auth_session(&tokens);
                let now = Utc::now();
                let lifetime =
                    chrono::Duration::seconds(self.config.session_lifetime.as_secs() as i64);
                state.tokens = Some(tokens);
                state.created_at = Some(now);
                state.expires_at = Some(now + lifetime);
                state.consecutive_failures = 0;
                self.persist(account_id, state);
                audit_auth_attempt(account_id, method, true);
                Ok(session)
            }
            Err(e) => {
                state.consecutive_failures += 1;
                self.persist(account_id, state);
                audit_auth_attempt(account_id, method, false);
                warn!(
                    account = %mask_account(account_id),
                    failures = state.consecutive_failures,
                    error = %e,
                    "authentication failed"
                );
                if state.consecutive_failures >= self.config.max_consecutive_failures {
                    security_event(account_id, "account disabled after repeated auth failures");
                }
                Err(e)
            }
        }
    }

    /// Write the encrypted session record for the account, or clear it
    /// when no session exists. Store failures are logged, not fatal: the
    /// in-memory session stays usable.
    fn persist(&self, account_id: &str, state: &SessionState) {
        let result = match (&state.tokens, state.created_at, state.expires_at) {
            (Some(tokens), Some(created_at), Some(expires_at)) => {
                let encrypted = self
                    .cipher
                    .encrypt(&tokens.session_id)
                    .and_then(|sid| Ok((sid, self.cipher.encrypt(&tokens.csrf_token)?)));
                match encrypted {
                    Ok((encrypted_session_token, encrypted_csrf_token)) => {
                        self.store.upsert(StoredSession {
                            account_id: account_id.to_string(),
                            encrypted_session_token,
                            encrypted_csrf_token,
                            created_at,
                            expires_at,
                            consecutive_failures: state.consecutive_failures,
                        })
                    }
                    Err(e) => Err(e),
                }
            }
            _ => self.store.remove(account_id),
        };
        if let Err(e) = result {
            warn!(account = %mask_account(account_id), error = %e, "failed to persist session");
        }
    }
}

fn auth_session(tokens: &AuthTokens) -> AuthSession {
    AuthSession {
        session_id: tokens.session_id.clone(),
        csrf_token: tokens.csrf_token.clone(),
    }
}

/// Per-account [`SessionProvider`] handed to the request layer.
struct AccountSessionProvider {
    manager: Arc<SessionManager>,
    account_id: String,
}

#[async_trait]
impl SessionProvider for AccountSessionProvider {
    async fn authenticated_session(&self) -> Result<AuthSession, FplClientError> {
        self.manager
            .ensure_authenticated(&self.account_id)
            .await
            .map_err(|e| FplClientError::AuthRequired { reason: e.to_string() })
    }

    async fn invalidate(&self) {
        self.manager.invalidate(&self.account_id).await;
    }
}

/// Account ids are masked in all audit output.
pub(crate) fn mask_account(account_id: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(account_id.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

fn audit_auth_attempt(account_id: &str, method: &str, success: bool) {
    tracing::info!(
        target: "audit",
        account = %mask_account(account_id),
        method,
        success,
        "authentication attempt"
    );
}

fn security_event(account_id: &str, event: &str) {
    tracing::warn!(
        target: "audit",
        account = %mask_account(account_id),
        event,
        "security event"
    );
}
