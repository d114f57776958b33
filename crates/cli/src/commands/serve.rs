use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use hoops_upstream::{insight_generator_from_config, NbaDataService, StatsClient};
use hoops_web_api::{ApiServer, AppState};

use super::bootstrap::{load_config, prediction_service};

/// Arguments for the serve command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address; overrides `server.host` and `server.port`
    #[arg(short, long)]
    pub addr: Option<String>,
}

/// Runs the web API until Ctrl-C.
///
/// # Errors
/// Returns an error if startup fails or the server cannot bind.
pub async fn run_serve(config_path: &str, args: ServeArgs) -> Result<()> {
    let config = load_config(config_path)?;
    tracing::info!("Starting prediction server with config: {}", config_path);

    let predictions = prediction_service(&config)?;
    let client = StatsClient::new(&config.upstream).context("Failed to build NBA stats client")?;
    let upstream = Arc::new(NbaDataService::new(client, &config.upstream));
    let insights = insight_generator_from_config(&config.insights);

    let state = AppState::new(predictions, upstream, insights);
    let server = ApiServer::new(state, config.server.cors_origins.clone());

    let addr = args.addr.unwrap_or_else(|| config.server.bind_addr());
    server.serve(&addr, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
