//! Global subscriber installation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Output mode picked from the config flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Silent,
    Json,
    Pretty,
}

impl LogFormat {
    pub(crate) fn of(config: &TelemetryConfig) -> Self {
        match (config.console_output, config.json_logs) {
            (false, _) => Self::Silent,
            (true, true) => Self::Json,
            (true, false) => Self::Pretty,
        }
    }
}

/// Install the subscriber for `config`. Fails if one is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .map_err(|e| TelemetryError::Config(format!("log filter {:?}: {e}", config.log_level)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match LogFormat::of(config) {
        LogFormat::Silent => registry.try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };
    installed.map_err(|e| TelemetryError::TracerInit(e.to_string()))
}
