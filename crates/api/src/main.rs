//! Vitals Risk Scoring Service - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load()?;
    init_logging(&config.log_level)?;

    info!("=== Vitals Risk Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Artifacts: {}", config.artifact_dir.display());

    run_server(&config).await
}
