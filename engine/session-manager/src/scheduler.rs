//! Background renewal loop.
//!
//! Periodically sweeps every tracked account and refreshes sessions that
//! have entered the renewal window, so request-path callers rarely pay the
//! authentication latency themselves.

use crate::manager::{mask_account, SessionManager};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct RenewalScheduler {
    manager: Arc<SessionManager>,
    interval: Duration,
    started: AtomicBool,
    shutdown: watch::Sender<bool>,
    handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl RenewalScheduler {
    pub fn new(manager: Arc<SessionManager>, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            manager,
            interval,
            started: AtomicBool::new(false),
            shutdown,
            handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Spawn the renewal loop. Idempotent: a second call is a no-op.
    pub async fn start(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("renewal scheduler already running");
            return;
        }

        let manager = Arc::clone(&self.manager);
        let interval = self.interval;
        let mut shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "renewal scheduler started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        // The sweep runs inside the tick arm so an
                        // in-flight pass completes before shutdown.
                        sweep(&manager).await;
                    }
                    _ = shutdown.changed() => {
                        info!("renewal scheduler stopping");
                        break;
                    }
                }
            }
        });
        *self.handle.lock().await = Some(handle);
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "renewal scheduler task panicked");
            }
        }
    }
}

/// One pass over every tracked account. Disabled accounts are skipped and
/// renewal failures are logged rather than aborting the sweep.
async fn sweep(manager: &SessionManager) {
    for account_id in manager.tracked_accounts() {
        let status = manager.session_status(&account_id).await;
        if status.disabled {
            debug!(account = %mask_account(&account_id), "skipping disabled account");
            continue;
        }
        if !status.expiring_soon {
            continue;
        }
        match manager.refresh(&account_id).await {
            Ok(_) => {
                info!(account = %mask_account(&account_id), "session renewed");
            }
            Err(e) => {
                warn!(
                    account = %mask_account(&account_id),
                    error = %e,
                    "scheduled session renewal failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionManagerConfig;
    use crate::manager::Credentials;
    use fpl_client::{HttpTransport, PreparedRequest, RawResponse, TransportError};

    struct AlwaysOkTransport;

    #[async_trait::async_trait]
    impl HttpTransport for AlwaysOkTransport {
        async fn send(&self, _req: PreparedRequest) -> Result<RawResponse, TransportError> {
            Ok(RawResponse { status: 200, body: String::new() })
        }
    }

    fn manager(dir: &tempfile::TempDir) -> Arc<SessionManager> {
        let config = SessionManagerConfig {
            key_file: dir.path().join("key"),
            state_file: dir.path().join("sessions.json"),
            ..SessionManagerConfig::default()
        };
        Arc::new(SessionManager::new(config, Arc::new(AlwaysOkTransport)).unwrap())
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = RenewalScheduler::new(manager(&dir), Duration::from_secs(60));

        scheduler.start().await;
        scheduler.start().await;
        assert!(scheduler.started.load(Ordering::SeqCst));

        scheduler.stop().await;
        assert!(!scheduler.started.load(Ordering::SeqCst));
        assert!(scheduler.handle.lock().await.is_none());

        // Stopping again is a no-op.
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn sweep_renews_expiring_sessions_only() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        manager.register_account("fresh", Credentials::from_tokens("sid-a", "csrf-a"));
        manager.register_account("stale", Credentials::from_tokens("sid-b", "csrf-b"));

        // "fresh" was just authenticated; "stale" has never been.
        manager.ensure_authenticated("fresh").await.unwrap();
        assert!(!manager.session_status("fresh").await.expiring_soon);
        assert!(manager.session_status("stale").await.expiring_soon);

        sweep(&manager).await;

        assert!(manager.session_status("stale").await.authenticated);
        assert!(!manager.session_status("stale").await.expiring_soon);
    }

    #[tokio::test]
    async fn sweep_skips_disabled_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        // Login-only credentials with no authenticator: every refresh fails.
        manager.register_account("broken", Credentials::from_login("user", "pw"));

        sweep(&manager).await;
        sweep(&manager).await;
        sweep(&manager).await;
        assert!(manager.session_status("broken").await.disabled);

        // Further sweeps leave the failure count at the threshold.
        sweep(&manager).await;
        assert_eq!(manager.session_status("broken").await.consecutive_failures, 3);
    }
}
