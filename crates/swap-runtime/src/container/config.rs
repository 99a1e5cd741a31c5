//! # Runtime Configuration
//!
//! Defaults suitable for a local regtest deployment, overridden by `SWAP_*`
//! environment variables in [`load_config`].

use bitcoin::Network;
use shared_types::{parse_address, Address};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Operator API.
    pub api: ApiConfig,
    /// Multisig gatekeeper.
    pub multisig: MultisigConfig,
    /// HTLC coordinator.
    pub htlc: HtlcSettings,
    /// File-backed interchange log; in-memory when `None`.
    pub interchange_path: Option<PathBuf>,
    /// Network used for BTC scripts and addresses.
    pub btc_network: BtcNetwork,
    /// Only seller the ledger accepts; the multisig address when `None`.
    pub market_maker: Option<Address>,
}

impl RuntimeConfig {
    /// Address allowed to create sell intents.
    pub fn market_maker(&self) -> Address {
        self.market_maker.unwrap_or(self.multisig.address)
    }
}

/// Operator API bind address.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8645,
        }
    }
}

impl ApiConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                var: "SWAP_API_HOST",
                value: self.host.clone(),
            })
    }
}

/// Owner set, threshold and custody address of the multisig.
#[derive(Debug, Clone)]
pub struct MultisigConfig {
    /// Owners in declaration order.
    pub owners: Vec<Address>,
    /// Confirmations required to execute.
    pub threshold: usize,
    /// Custody address; sender of every gated ETH lock.
    pub address: Address,
}

impl Default for MultisigConfig {
    fn default() -> Self {
        Self {
            owners: vec![dev_address(0xA1), dev_address(0xA2), dev_address(0xA3)],
            threshold: 2,
            address: dev_address(0x5A),
        }
    }
}

/// HTLC coordinator settings.
#[derive(Debug, Clone, Default)]
pub struct HtlcSettings {
    /// Minimum gap between paired timelocks, in seconds.
    pub timelock_margin_secs: u64,
}

/// Wrapper so the network has a regtest default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtcNetwork(pub Network);

impl Default for BtcNetwork {
    fn default() -> Self {
        Self(Network::Regtest)
    }
}

/// Addresses the multisig calls into.
pub mod contracts {
    use shared_types::Address;

    /// HTLC contract destination.
    pub const HTLC: Address = [0x48; 20];
    /// Intent ledger destination.
    pub const INTENT_LEDGER: Address = [0x49; 20];
}

fn dev_address(fill: u8) -> Address {
    let mut addr = [0u8; 20];
    addr[19] = fill;
    addr[0] = 0xD0;
    addr
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// No multisig owners configured.
    #[error("Multisig owner set is empty")]
    EmptyOwnerSet,

    /// Threshold outside 1..=owners.
    #[error("Multisig threshold {threshold} invalid for {owners} owners")]
    InvalidThreshold {
        /// Requested threshold
        threshold: usize,
        /// Owner count
        owners: usize,
    },

    /// The same owner listed twice.
    #[error("Duplicate multisig owner 0x{0}")]
    DuplicateOwner(String),
}

impl RuntimeConfig {
    /// Reject configurations the multisig could not be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let owners = &self.multisig.owners;
        if owners.is_empty() {
            return Err(ConfigError::EmptyOwnerSet);
        }
        if self.multisig.threshold == 0 || self.multisig.threshold > owners.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.multisig.threshold,
                owners: owners.len(),
            });
        }
        let mut seen = HashSet::new();
        for owner in owners {
            if !seen.insert(owner) {
                return Err(ConfigError::DuplicateOwner(hex::encode(owner)));
            }
        }
        self.api.socket_addr()?;
        Ok(())
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<RuntimeConfig, ConfigError> {
    load_config_from(|var| std::env::var(var).ok())
}

/// Load configuration from an arbitrary variable lookup.
pub fn load_config_from<F>(lookup: F) -> Result<RuntimeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RuntimeConfig::default();

    if let Some(host) = lookup("SWAP_API_HOST") {
        config.api.host = host;
    }
    if let Some(port) = lookup("SWAP_API_PORT") {
        config.api.port = parse_var("SWAP_API_PORT", &port)?;
    }

    if let Some(owners) = lookup("SWAP_MULTISIG_OWNERS") {
        config.multisig.owners = owners
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                parse_address(s).ok_or(ConfigError::InvalidValue {
                    var: "SWAP_MULTISIG_OWNERS",
                    value: s.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
    }
    if let Some(threshold) = lookup("SWAP_MULTISIG_THRESHOLD") {
        config.multisig.threshold = parse_var("SWAP_MULTISIG_THRESHOLD", &threshold)?;
    }
    if let Some(address) = lookup("SWAP_MULTISIG_ADDRESS") {
        config.multisig.address =
            parse_address(address.trim()).ok_or(ConfigError::InvalidValue {
                var: "SWAP_MULTISIG_ADDRESS",
                value: address,
            })?;
    }

    if let Some(maker) = lookup("SWAP_MARKET_MAKER") {
        config.market_maker = Some(parse_address(maker.trim()).ok_or(
            ConfigError::InvalidValue {
                var: "SWAP_MARKET_MAKER",
                value: maker,
            },
        )?);
    }

    if let Some(margin) = lookup("SWAP_TIMELOCK_MARGIN_SECS") {
        config.htlc.timelock_margin_secs = parse_var("SWAP_TIMELOCK_MARGIN_SECS", &margin)?;
    }
    if let Some(path) = lookup("SWAP_INTERCHANGE_PATH") {
        if !path.trim().is_empty() {
            config.interchange_path = Some(PathBuf::from(path));
        }
    }
    if let Some(network) = lookup("SWAP_BTC_NETWORK") {
        config.btc_network = BtcNetwork(parse_var("SWAP_BTC_NETWORK", &network)?);
    }

    config.validate()?;
    Ok(config)
}

fn parse_var<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}
