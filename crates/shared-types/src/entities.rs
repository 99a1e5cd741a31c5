//! # Core Domain Entities
//!
//! Primitive aliases and identifiers used across the swap subsystems.
//!
//! ## Units
//!
//! - ETH amounts are denominated in wei and carried as [`U256`].
//! - BTC amounts are denominated in satoshi and carried as `u64`.

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte hash (keccak256 or sha256 depending on the chain).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Satoshi amount on the BTC leg.
pub type Satoshi = u64;

/// Satoshis per bitcoin.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Wei per ether.
pub fn wei_per_eth() -> U256 {
    U256::exp10(18)
}

/// Convert whole ether to wei.
pub fn eth_to_wei(eth: u64) -> U256 {
    U256::from(eth) * wei_per_eth()
}

/// The two chains a swap spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainId {
    /// Ethereum leg (keccak256 hash locks, wei amounts).
    Eth,
    /// Bitcoin leg (sha256 hash locks, satoshi amounts).
    Btc,
}

impl ChainId {
    /// Stable one-byte tag used when hashing identifiers.
    pub fn tag(&self) -> u8 {
        match self {
            ChainId::Eth => 0x01,
            ChainId::Btc => 0x02,
        }
    }

    /// The opposite leg.
    pub fn counterpart(&self) -> ChainId {
        match self {
            ChainId::Eth => ChainId::Btc,
            ChainId::Btc => ChainId::Eth,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Eth => f.write_str("ETH"),
            ChainId::Btc => f.write_str("BTC"),
        }
    }
}

/// Render the first bytes of an identifier for log lines.
pub fn short_hex(bytes: &[u8]) -> String {
    let end = bytes.len().min(4);
    format!("0x{}..", hex::encode(&bytes[..end]))
}

/// Parse a `0x`-prefixed (or bare) hex string into a 20-byte address.
pub fn parse_address(s: &str) -> Option<Address> {
    let raw = hex::decode(s.trim().trim_start_matches("0x")).ok()?;
    raw.try_into().ok()
}
