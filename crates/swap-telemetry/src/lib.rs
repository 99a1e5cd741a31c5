//! # Swap Telemetry
//!
//! Log subscriber and Prometheus counters for the swap coordinator.
//!
//! Call [`init_telemetry`] once at startup and keep the returned
//! [`TelemetryGuard`] alive. Subsystems record through the `record_*`
//! functions; the runtime serves [`encode_metrics`] on `/metrics`.
//!
//! ```rust,ignore
//! let _telemetry = swap_telemetry::init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! Settings come from `SWAP_SERVICE_NAME`, `SWAP_LOG_LEVEL` (else `RUST_LOG`),
//! `SWAP_JSON_LOGS`, `SWAP_CONSOLE_OUTPUT` and `SWAP_NETWORK`.

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, metrics, record_intent_submitted, record_liquidity_shortfall,
    record_lock_created, record_lock_settled, record_multisig_execution,
    record_operator_request, record_trades_matched, register_metrics, MetricsHandle, SwapMetrics,
};
pub use tracing_setup::init_tracing;

/// Failures while bringing telemetry up.
#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed, or installing it failed.
    #[error("log subscriber: {0}")]
    TracerInit(String),

    /// The metric registry rejected a collector or could not render.
    #[error("metrics registry: {0}")]
    MetricsInit(String),

    /// Unusable setting, such as a malformed filter directive.
    #[error("telemetry config: {0}")]
    Config(String),
}

/// Keeps the metric registry reachable until dropped.
#[must_use = "telemetry stops reporting once the guard is dropped"]
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "telemetry stopped");
    }
}

/// Build the metric registry, then install the log subscriber.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_tracing(&config)?;

    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        json = config.json_logs,
        "telemetry started"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// `info_span!` with a fixed name and caller-supplied fields.
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        ::tracing::info_span!($name, $($field)*)
    };
}
