//! # Domain Entities
//!
//! Lock records and the structured results of settling them.

use super::value_objects::{LockId, LockState, Participant};
use serde::{Deserialize, Serialize};
use shared_types::{hex_serde, ChainId, HashLock, Satoshi, Timestamp, U256};

/// Parameters of a lock before it is escrowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockParams {
    /// Chain the escrow lives on.
    pub chain: ChainId,
    /// Party funding the escrow and receiving refunds.
    pub sender: Participant,
    /// Party able to withdraw with the preimage.
    pub recipient: Participant,
    /// Committed hashes of the preimage.
    pub hash_lock: HashLock,
    /// Absolute refund deadline.
    pub timelock: Timestamp,
    /// Wei on ETH, satoshi on BTC.
    pub amount: U256,
}

/// What the chain reported when funds were escrowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowReceipt {
    /// Chain-side transaction reference.
    #[serde(with = "hex_serde")]
    pub tx_ref: [u8; 32],
    /// Escrow address (P2SH on BTC, custody contract on ETH).
    pub escrow_address: String,
    /// Hex redeem script on BTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<String>,
}

/// A recorded hash-time-locked escrow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    /// Lock id.
    #[serde(with = "hex_serde")]
    pub lock_id: LockId,
    /// Chain.
    pub chain: ChainId,
    /// Funding party.
    pub sender: Participant,
    /// Withdrawing party.
    pub recipient: Participant,
    /// `{keccak256, sha256}` of the preimage.
    #[serde(rename = "secretHash")]
    pub hash_lock: HashLock,
    /// Absolute refund deadline.
    pub timelock: Timestamp,
    /// Escrowed amount.
    pub amount: U256,
    /// Current state.
    pub state: LockState,
    /// Escrow confirmation.
    pub escrow: EscrowReceipt,
    /// Creation time.
    pub created_at: Timestamp,
    /// When the lock reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<Timestamp>,
}

impl Lock {
    /// Parameters this lock was created from.
    pub fn params(&self) -> LockParams {
        LockParams {
            chain: self.chain,
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            hash_lock: self.hash_lock,
            timelock: self.timelock,
            amount: self.amount,
        }
    }
}

/// Result of a withdraw or refund.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Lock id.
    #[serde(with = "hex_serde")]
    pub lock_id: LockId,
    /// Chain.
    pub chain: ChainId,
    /// Resulting state.
    pub state: LockState,
    /// Amount moved.
    pub amount: U256,
    /// Party paid.
    pub paid_to: Participant,
    /// Preimage published by a withdraw.
    #[serde(
        default,
        with = "option_hex",
        skip_serializing_if = "Option::is_none"
    )]
    pub preimage: Option<Vec<u8>>,
}

/// An unspent output on the BTC leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    /// Funding transaction reference.
    #[serde(with = "hex_serde")]
    pub txid: [u8; 32],
    /// Output index.
    pub vout: u32,
    /// Value in satoshi.
    pub value: Satoshi,
    /// Address paid.
    pub address: String,
}

mod option_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_str(&format!("0x{}", hex::encode(bytes))),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom))
            .transpose()
    }
}
