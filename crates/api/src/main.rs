//! Drone Telemetry Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("failed to load configuration")?;
    init_logging(&config.server.log_level).context("failed to initialize logging")?;

    info!("=== Drone Telemetry Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Thresholds: A={}, W={}, percentage={}%",
        config.session.anomaly.acceleration_threshold,
        config.session.anomaly.wind_threshold,
        config.session.anomaly.threshold_percentage
    );

    run_server(&config).await
}
