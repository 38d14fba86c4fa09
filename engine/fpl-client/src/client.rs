//! The FPL API client: cache-first reads, classified retries, typed
//! endpoints.

use crate::cache::ResponseCache;
use crate::config::FplClientConfig;
use crate::error::FplClientError;
use crate::models::{Bootstrap, Element, EntryPicks, Fixture};
use crate::retry::{classify, Outcome, RetryPolicy};
use crate::session::SessionProvider;
use crate::transport::{HttpTransport, Method, PreparedRequest, ReqwestTransport};
use fpl_domain::Squad;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Status sentinel recorded in audit output when no connection was made.
const STATUS_NO_CONNECTION: u16 = 0;

/// Difficulty reported when a fixture has no rating for a team.
const DEFAULT_FIXTURE_DIFFICULTY: u8 = 3;

/// Client for the upstream fantasy API.
///
/// Holds the response cache and talks to the network through the
/// [`HttpTransport`] seam. Authenticated requests pull session material
/// from the configured [`SessionProvider`].
pub struct FplClient {
    config: FplClientConfig,
    transport: Arc<dyn HttpTransport>,
    cache: ResponseCache,
    session: Option<Arc<dyn SessionProvider>>,
}

impl FplClient {
    /// Create a client over an explicit transport (tests inject a scripted
    /// one here).
    pub fn new(config: FplClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport, cache: ResponseCache::new(), session: None }
    }

    /// Create a client over the production reqwest transport.
    pub fn connect(config: FplClientConfig) -> crate::Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Attach the session provider used for authenticated requests.
    pub fn with_session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn config(&self) -> &FplClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Core request contract: cache-first for cacheable GETs, classified
    /// retries with exponential backoff, a single re-authentication on
    /// 401, terminal 4xx returned immediately.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        cache_ttl: Option<Duration>,
        authenticated: bool,
        body: Option<Value>,
    ) -> crate::Result<Value> {
        let policy = self.config.retry.clone();
        self.request_with_policy(method, url, cache_ttl, authenticated, body, &policy).await
    }

    /// Same contract with an explicit retry budget (the transfer POST uses
    /// a tighter one).
    pub async fn request_with_policy(
        &self,
        method: Method,
        url: &str,
        cache_ttl: Option<Duration>,
        authenticated: bool,
        body: Option<Value>,
        policy: &RetryPolicy,
    ) -> crate::Result<Value> {
        if method == Method::Get {
            if let Some(_ttl) = cache_ttl {
                if let Some(hit) = self.cache.get(url) {
                    debug!(url, "cache hit");
                    audit_request(url, method, 200);
                    return Ok(hit);
                }
            }
        }

        // Fail fast when an authenticated call cannot get a session at all.
        let provider = if authenticated {
            let provider = self.session.as_ref().ok_or_else(|| {
                FplClientError::AuthRequired { reason: "no session provider configured".into() }
            })?;
            Some(provider)
        } else {
            None
        };
        let mut auth_headers = match provider {
            Some(provider) => provider.authenticated_session().await?.headers(),
            None => Vec::new(),
        };

        let mut reauthenticated = false;
        let mut attempt: u32 = 1;
        loop {
            let request = PreparedRequest {
                method,
                url: url.to_string(),
                headers: auth_headers.clone(),
                body: body.clone(),
            };

            let last_error: FplClientError = match self.transport.send(request).await {
                Err(transport_err) => {
                    audit_request(url, method, STATUS_NO_CONNECTION);
                    warn!(url, error = %transport_err, attempt, "connection error");
                    transport_err.into()
                }
                Ok(response) => {
                    audit_request(url, method, response.status);
                    match classify(response.status) {
                        Outcome::Success => {
                            let value: Value = serde_json::from_str(&response.body)?;
                            if method == Method::Get {
                                if let Some(ttl) = cache_ttl {
                                    self.cache.put(url, value.clone(), ttl);
                                }
                            }
                            return Ok(value);
                        }
                        Outcome::Unauthorized => {
                            if let (Some(provider), false) = (provider, reauthenticated) {
                                warn!(url, "unauthorized, re-authenticating once");
                                reauthenticated = true;
                                provider.invalidate().await;
                                auth_headers =
                                    provider.authenticated_session().await?.headers();
                                FplClientError::Upstream {
                                    status: response.status,
                                    body: response.body,
                                }
                            } else {
                                return Err(FplClientError::Upstream {
                                    status: response.status,
                                    body: response.body,
                                });
                            }
                        }
                        Outcome::Retryable => {
                            warn!(url, status = response.status, attempt, "retryable status");
                            FplClientError::Upstream {
                                status: response.status,
                                body: response.body,
                            }
                        }
                        Outcome::Terminal => {
                            return Err(FplClientError::Upstream {
                                status: response.status,
                                body: response.body,
                            });
                        }
                    }
                }
            };

            if attempt >= policy.max_attempts {
                return Err(FplClientError::Exhausted {
                    attempts: attempt,
                    last_error: last_error.to_string(),
                });
            }
            tokio::time::sleep(policy.delay_for(attempt)).await;
            attempt += 1;
        }
    }

    async fn get_cached(&self, path: &str, ttl: Duration) -> crate::Result<Value> {
        self.request(Method::Get, &self.url(path), Some(ttl), false, None).await
    }

    /// Static bootstrap payload; cacheable with the long TTL.
    pub async fn bootstrap_static(&self) -> crate::Result<Bootstrap> {
        let value = self.get_cached("/bootstrap-static/", self.config.bootstrap_ttl).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fixtures list; cacheable with the short TTL.
    pub async fn fixtures(&self) -> crate::Result<Vec<Fixture>> {
        let value = self.get_cached("/fixtures/", self.config.fixtures_ttl).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Per-player summary; not cached (gameweek history moves).
    pub async fn player_summary(&self, player_id: u32) -> crate::Result<Value> {
        let url = self.url(&format!("/element-summary/{player_id}/"));
        self.request(Method::Get, &url, None, false, None).await
    }

    /// Entry (team) detail for the account; authenticated.
    pub async fn entry(&self, team_id: u32) -> crate::Result<Value> {
        let url = self.url(&format!("/entry/{team_id}/"));
        self.request(Method::Get, &url, None, true, None).await
    }

    /// Gameweek picks for the account; authenticated. Resolves the current
    /// gameweek from bootstrap when none is given.
    pub async fn entry_picks(
        &self,
        team_id: u32,
        gameweek: Option<u32>,
    ) -> crate::Result<EntryPicks> {
        let gameweek = match gameweek {
            Some(gw) => gw,
            None => self.current_gameweek().await?,
        };
        let url = self.url(&format!("/entry/{team_id}/event/{gameweek}/picks/"));
        let value = self.request(Method::Get, &url, None, true, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Current gameweek id (current, else next).
    pub async fn current_gameweek(&self) -> crate::Result<u32> {
        self.bootstrap_static().await?.current_gameweek().ok_or_else(|| {
            FplClientError::MissingData("could not determine current gameweek".into())
        })
    }

    /// Bootstrap entry for a single player, if known.
    pub async fn player_info(&self, player_id: u32) -> crate::Result<Option<Element>> {
        let bootstrap = self.bootstrap_static().await?;
        Ok(bootstrap.elements.into_iter().find(|e| e.id == player_id))
    }

    /// Fixture difficulty for a team in a gameweek; medium (3) when no
    /// fixture or rating is found.
    pub async fn fixture_difficulty(&self, team_id: u32, gameweek: u32) -> crate::Result<u8> {
        let fixtures = self.fixtures().await?;
        for fixture in fixtures {
            if fixture.event != Some(gameweek) {
                continue;
            }
            if fixture.team_h == team_id {
                return Ok(fixture.team_h_difficulty.unwrap_or(DEFAULT_FIXTURE_DIFFICULTY));
            }
            if fixture.team_a == team_id {
                return Ok(fixture.team_a_difficulty.unwrap_or(DEFAULT_FIXTURE_DIFFICULTY));
            }
        }
        Ok(DEFAULT_FIXTURE_DIFFICULTY)
    }

    /// The account's squad and bank for a gameweek, assembled from the
    /// picks and the bootstrap element table. Picks whose element id is
    /// unknown to bootstrap are skipped.
    pub async fn current_squad(
        &self,
        team_id: u32,
        gameweek: Option<u32>,
    ) -> crate::Result<(Squad, i64)> {
        let picks = self.entry_picks(team_id, gameweek).await?;
        let bootstrap = self.bootstrap_static().await?;

        let mut players = Vec::with_capacity(picks.picks.len());
        for pick in &picks.picks {
            if let Some(element) = bootstrap.elements.iter().find(|e| e.id == pick.element) {
                players.push(element.clone().into_player()?);
            } else {
                warn!(element = pick.element, "pick not present in bootstrap elements");
            }
        }
        Ok((Squad::new(players), picks.entry_history.bank))
    }

    /// Submit a transfer payload; authenticated POST with the tighter
    /// transfer retry budget.
    pub async fn submit_transfers(&self, payload: Value) -> crate::Result<Value> {
        let url = self.url("/transfers/");
        let policy = self.config.transfer_retry.clone();
        self.request_with_policy(Method::Post, &url, None, true, Some(payload), &policy).await
    }
}

/// One structured observability record per attempt: endpoint, method, and
/// resulting status (0 when no connection was made).
fn audit_request(endpoint: &str, method: Method, status: u16) {
    tracing::info!(target: "audit", endpoint, method = %method, status, "api request");
}
