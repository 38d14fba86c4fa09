//! FPL automation service entry point.
//!
//! Brings up the session manager and API client, starts the background
//! session renewal loop, and runs until interrupted.

use anyhow::{Context, Result};
use tracing::info;

use fpl_bot_service::{initialize_logging, FplBotService, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    initialize_logging()?;

    info!("Starting FPL bot service v{}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::load().context("Failed to load configuration")?;
    info!(team = config.team_id, "Configuration loaded");

    let service = FplBotService::new(config).context("Failed to initialize service")?;
    service.start().await;

    info!("FPL bot service is running. Press Ctrl+C to shut down.");
    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    service.shutdown().await;

    info!("FPL bot service shutdown complete");
    Ok(())
}
