//! Wiring of the transport, session manager, client, and executor.

use crate::config::ServiceConfig;
use anyhow::{Context, Result};
use fpl_client::{FplClient, ReqwestTransport};
use fpl_domain::{ActiveChips, TransferRequest};
use session_manager::{RenewalScheduler, SessionManager};
use std::sync::Arc;
use tracing::info;
use transfer_engine::{ExecutionReport, ExecutionRequest, TransferExecutor};

/// The assembled system. One shared reqwest transport feeds both the API
/// client and the session manager's validity probes.
pub struct FplBotService {
    config: ServiceConfig,
    client: Arc<FplClient>,
    manager: Arc<SessionManager>,
    scheduler: RenewalScheduler,
    executor: TransferExecutor,
}

impl FplBotService {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let transport = Arc::new(
            ReqwestTransport::new(config.client.request_timeout)
                .context("failed to build HTTP transport")?,
        );

        let manager = Arc::new(
            SessionManager::new(config.session.clone(), transport.clone())
                .context("failed to initialize session manager")?,
        );
        manager.register_account(&config.account_id(), config.credentials.clone());

        let client = Arc::new(
            FplClient::new(config.client.clone(), transport)
                .with_session(manager.provider_for(&config.account_id())),
        );

        let scheduler = RenewalScheduler::new(manager.clone(), config.session.refresh_interval);
        let executor = TransferExecutor::new(client.clone());

        Ok(Self { config, client, manager, scheduler, executor })
    }

    /// Start the background session renewal loop.
    pub async fn start(&self) {
        self.scheduler.start().await;
        info!(team = self.config.team_id, "service started");
    }

    /// Stop background work, letting an in-flight renewal finish.
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
        info!("service stopped");
    }

    pub fn client(&self) -> &Arc<FplClient> {
        &self.client
    }

    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Validate and submit a transfer batch for the configured team,
    /// against the squad and bank as the upstream currently reports them.
    pub async fn execute_transfers(
        &self,
        transfers: &[TransferRequest],
        chips: ActiveChips,
        override_failures: bool,
    ) -> Result<ExecutionReport> {
        let gameweek = self
            .client
            .current_gameweek()
            .await
            .context("failed to resolve current gameweek")?;
        let (squad, bank) = self
            .client
            .current_squad(self.config.team_id as u32, Some(gameweek))
            .await
            .context("failed to load current squad")?;

        let report = self
            .executor
            .execute(&ExecutionRequest {
                entry: self.config.team_id,
                transfers,
                squad: &squad,
                bank,
                gameweek,
                chips,
                override_failures,
            })
            .await;
        Ok(report)
    }
}
