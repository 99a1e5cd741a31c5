//! Telemetry settings read from `SWAP_*` environment variables.

use std::env;

const DEFAULT_SERVICE: &str = "swap-coordinator";
const DEFAULT_FILTER: &str = "info";
const DEFAULT_NETWORK: &str = "regtest";

/// Where log lines go and what they look like.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Stamped on the startup line so mixed log streams can be told apart.
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `sc_02_htlc=debug,info`.
    pub log_level: String,

    /// When false no formatter is installed and only the filter is active.
    pub console_output: bool,

    /// One JSON object per line instead of the human formatter.
    pub json_logs: bool,

    /// Bitcoin network label echoed at startup.
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE.into(),
            log_level: DEFAULT_FILTER.into(),
            console_output: true,
            json_logs: false,
            network: DEFAULT_NETWORK.into(),
        }
    }
}

impl TelemetryConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    ///
    /// JSON output is the default whenever a container marker is present.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let containerised =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let base = Self::default();

        Self {
            service_name: lookup("SWAP_SERVICE_NAME").unwrap_or(base.service_name),
            log_level: lookup("SWAP_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(base.log_level),
            console_output: lookup("SWAP_CONSOLE_OUTPUT")
                .map_or(base.console_output, |raw| is_truthy(&raw)),
            json_logs: lookup("SWAP_JSON_LOGS").map_or(containerised, |raw| is_truthy(&raw)),
            network: lookup("SWAP_NETWORK").unwrap_or(base.network),
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_matches_default() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.service_name, DEFAULT_SERVICE);
        assert_eq!(config.log_level, DEFAULT_FILTER);
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_rust_log_is_fallback_filter() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[("RUST_LOG", "debug")]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_lookup(lookup_from(&[
            ("RUST_LOG", "debug"),
            ("SWAP_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_container_switches_json_on_unless_overridden() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[("DOCKER_CONTAINER", "1")]));
        assert!(config.json_logs);

        let config = TelemetryConfig::from_lookup(lookup_from(&[
            ("DOCKER_CONTAINER", "1"),
            ("SWAP_JSON_LOGS", "off"),
        ]));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy(" Yes "));
        assert!(is_truthy("ON"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("nope"));
    }
}
