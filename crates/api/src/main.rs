//! Housing Price Prediction Server - Main Entry Point

use api::{init_logging, run_server, ServerConfig, ServerError};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    init_logging()?;

    info!("=== Housing Price Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Model: {}", config.model_path.display());

    run_server(config).await
}
