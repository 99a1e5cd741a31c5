//! # Domain Value Objects
//!
//! Lock state machine and chain participants.

use super::errors::HtlcError;
use serde::{Deserialize, Serialize};
use shared_types::{hex_serde, Address, ChainId, Hash};
use std::fmt;

/// Lock identifier.
pub type LockId = Hash;

/// Lock lifecycle.
///
/// ```text
/// Locked ──→ Withdrawn   (preimage presented)
///    │
///    └─────→ Refunded    (timelock reached)
/// ```
///
/// A lock is only recorded once its escrow is confirmed by the chain, so the
/// validated-but-unfunded stage lives in [`LockParams`](super::LockParams)
/// and never in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// Funds escrowed, hash and timelock committed.
    Locked,
    /// Released to the recipient.
    Withdrawn,
    /// Returned to the sender.
    Refunded,
}

impl LockState {
    /// Only `Locked` moves, and only to a terminal state.
    pub fn can_transition_to(&self, next: LockState) -> bool {
        matches!(
            (self, next),
            (Self::Locked, Self::Withdrawn) | (Self::Locked, Self::Refunded)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Locked)
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Withdrawn => "withdrawn",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A party to a lock, identified the way its chain identifies it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "chain", content = "id")]
pub enum Participant {
    /// 20-byte account on the ETH leg.
    #[serde(rename = "ETH")]
    Eth(#[serde(with = "hex_serde")] Address),
    /// Compressed secp256k1 key on the BTC leg.
    #[serde(rename = "BTC")]
    Btc(bitcoin::PublicKey),
}

impl Participant {
    /// Chain this participant lives on.
    pub fn chain(&self) -> ChainId {
        match self {
            Participant::Eth(_) => ChainId::Eth,
            Participant::Btc(_) => ChainId::Btc,
        }
    }

    /// Reject the zero account and uncompressed keys.
    pub fn validate(&self) -> Result<(), HtlcError> {
        match self {
            Participant::Eth(addr) if *addr == [0u8; 20] => {
                Err(HtlcError::InvalidParticipant("zero ETH address".into()))
            }
            Participant::Btc(key) if !key.compressed => {
                Err(HtlcError::InvalidParticipant("uncompressed BTC key".into()))
            }
            _ => Ok(()),
        }
    }

    /// Canonical bytes for identifier hashing.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Participant::Eth(addr) => addr.to_vec(),
            Participant::Btc(key) => key.to_bytes(),
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Eth(addr) => write!(f, "ETH:0x{}", hex::encode(addr)),
            Participant::Btc(key) => write!(f, "BTC:{}", key),
        }
    }
}
