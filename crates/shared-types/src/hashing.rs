//! # Hash Locks
//!
//! The two legs of a swap commit to the same preimage under different hash
//! functions: keccak256 on ETH, sha256 on BTC.

use crate::entities::{ChainId, Hash};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// keccak256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// sha256 of `data`.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash pair committed by both legs of one logical trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashLock {
    /// keccak256(preimage), checked on the ETH leg.
    #[serde(with = "crate::hex_serde")]
    pub keccak256: Hash,
    /// sha256(preimage), checked on the BTC leg.
    #[serde(with = "crate::hex_serde")]
    pub sha256: Hash,
}

impl HashLock {
    /// Derive both hashes from one preimage.
    pub fn of(preimage: &[u8]) -> Self {
        Self {
            keccak256: keccak256(preimage),
            sha256: sha256(preimage),
        }
    }

    /// The hash a given chain verifies.
    pub fn for_chain(&self, chain: ChainId) -> Hash {
        match chain {
            ChainId::Eth => self.keccak256,
            ChainId::Btc => self.sha256,
        }
    }

    /// Check a preimage with the chain-specific hash function.
    pub fn matches(&self, chain: ChainId, preimage: &[u8]) -> bool {
        let computed = match chain {
            ChainId::Eth => keccak256(preimage),
            ChainId::Btc => sha256(preimage),
        };
        computed == self.for_chain(chain)
    }
}
