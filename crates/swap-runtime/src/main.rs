//! # Swap Coordinator
//!
//! Startup sequence:
//!
//! 1. Initialize logging and metrics
//! 2. Load and validate configuration from `SWAP_*` variables
//! 3. Wire subsystems in dependency order
//! 4. Serve the operator API until Ctrl-C

use anyhow::{Context, Result};
use std::sync::Arc;
use swap_runtime::container::{load_config, SwapContainer};
use swap_runtime::handlers::OperatorApi;
use swap_runtime::server::{self, AppState};
use swap_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Swap Coordinator v{}", swap_runtime::VERSION);
    info!("===========================================");

    let config = load_config().context("Invalid configuration")?;
    let addr = config.api.socket_addr().context("Invalid API address")?;
    if config.interchange_path.is_none() {
        warn!("[runtime] SWAP_INTERCHANGE_PATH unset, batch secrets will not survive a restart");
    }
    info!(
        "[runtime] Multisig {} of {} owners",
        config.multisig.threshold,
        config.multisig.owners.len()
    );

    let container = Arc::new(SwapContainer::new(config).context("Failed to wire subsystems")?);
    let state = AppState {
        api: Arc::new(OperatorApi::new(container)),
    };

    server::serve(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("[runtime] Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("[runtime] Shutdown signal received");
    })
    .await
    .context("Operator API failed")?;

    info!("[runtime] Stopped");
    Ok(())
}
