//! # Domain Entities
//!
//! The interchange document and the events it is folded from.

use super::errors::BridgeError;
use super::secure_secret::SecureSecret;
use super::value_objects::{BuyIntentId, SecretPolicy, TradeIndex};
use serde::{Deserialize, Serialize};
use shared_types::{hex_serde, Address, Hash, HashLock, Satoshi, Timestamp, U256};

/// One lock of a batch, as both chain subsystems see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcRecord {
    /// Position within the batch.
    pub trade_index: TradeIndex,
    /// Ledger trade this lock settles.
    pub trade_id: u64,
    /// Sell intent on the other side.
    pub sell_intent_id: u64,
    /// ETH lock id.
    #[serde(with = "hex_serde")]
    pub lock_id: Hash,
    /// BTC lock id, once the BTC leg is open.
    #[serde(
        default,
        with = "hex_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub btc_lock_id: Option<Hash>,
    /// ETH lock timelock.
    pub locktime: Timestamp,
    /// keccak256 committed on ETH.
    #[serde(with = "hex_serde")]
    pub secret_hash_keccak: Hash,
    /// sha256 committed on BTC.
    #[serde(with = "hex_serde")]
    pub secret_hash_sha256: Hash,
    /// ETH amount in wei.
    pub eth_amount: U256,
    /// BTC amount in satoshi.
    pub btc_amount: Satoshi,
    /// ETH recipient.
    #[serde(with = "hex_serde")]
    pub recipient: Address,
}

impl HtlcRecord {
    /// The hash pair this record commits to.
    pub fn hash_lock(&self) -> HashLock {
        HashLock {
            keccak256: self.secret_hash_keccak,
            sha256: self.secret_hash_sha256,
        }
    }
}

/// Entries of the append-only interchange log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum InterchangeEvent {
    /// First write for a buy intent; fixes its secret and policy.
    #[serde(rename_all = "camelCase")]
    Seeded {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Declared policy
        policy: SecretPolicy,
        /// Base secret
        base_secret: SecureSecret,
        /// When
        at: Timestamp,
    },
    /// ETH lock opened for a trade.
    #[serde(rename_all = "camelCase")]
    LockRecorded {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Lock details
        record: HtlcRecord,
    },
    /// BTC lock opened for a trade.
    #[serde(rename_all = "camelCase")]
    CounterpartLockRecorded {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Trade index
        trade_index: TradeIndex,
        /// BTC lock id
        #[serde(with = "hex_serde")]
        btc_lock_id: Hash,
    },
    /// Preimage of a trade handed out for reveal.
    #[serde(rename_all = "camelCase")]
    SecretRevealed {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Trade index
        trade_index: TradeIndex,
        /// When
        at: Timestamp,
    },
}

impl InterchangeEvent {
    /// Batch the event belongs to.
    pub fn buy_intent_id(&self) -> BuyIntentId {
        match self {
            InterchangeEvent::Seeded { buy_intent_id, .. }
            | InterchangeEvent::LockRecorded { buy_intent_id, .. }
            | InterchangeEvent::CounterpartLockRecorded { buy_intent_id, .. }
            | InterchangeEvent::SecretRevealed { buy_intent_id, .. } => *buy_intent_id,
        }
    }
}

/// The synchronization artifact between the ETH and BTC subsystems.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeDocument {
    /// Batch.
    pub buy_intent_id: BuyIntentId,
    /// Declared policy.
    pub policy: SecretPolicy,
    /// Base secret.
    pub base_secret: SecureSecret,
    /// keccak256(baseSecret).
    #[serde(with = "hex_serde")]
    pub base_keccak: Hash,
    /// sha256(baseSecret).
    #[serde(with = "hex_serde")]
    pub base_sha256: Hash,
    /// Locks in trade-index order.
    pub htlcs: Vec<HtlcRecord>,
    /// Trade indices whose preimage was revealed.
    #[serde(default)]
    pub revealed: Vec<TradeIndex>,
}

impl InterchangeDocument {
    /// Fold a buy intent's events. `None` when it was never seeded.
    pub fn replay<'a, I>(events: I) -> Result<Option<Self>, BridgeError>
    where
        I: IntoIterator<Item = &'a InterchangeEvent>,
    {
        let mut doc: Option<Self> = None;
        for event in events {
            match (&mut doc, event) {
                (
                    None,
                    InterchangeEvent::Seeded {
                        buy_intent_id,
                        policy,
                        base_secret,
                        ..
                    },
                ) => {
                    let lock = HashLock::of(base_secret.as_bytes());
                    doc = Some(Self {
                        buy_intent_id: *buy_intent_id,
                        policy: *policy,
                        base_secret: base_secret.clone(),
                        base_keccak: lock.keccak256,
                        base_sha256: lock.sha256,
                        htlcs: Vec::new(),
                        revealed: Vec::new(),
                    });
                }
                // Later seeds lost the race; the first one stands.
                (Some(_), InterchangeEvent::Seeded { .. }) => {}
                (None, other) => return Err(BridgeError::NotSeeded(other.buy_intent_id())),
                (Some(d), event) => d.apply(event),
            }
        }
        Ok(doc)
    }

    fn apply(&mut self, event: &InterchangeEvent) {
        match event {
            InterchangeEvent::Seeded { .. } => {}
            InterchangeEvent::LockRecorded { record, .. } => {
                if self.record(record.trade_index).is_none() {
                    self.htlcs.push(record.clone());
                    self.htlcs.sort_by_key(|r| r.trade_index);
                }
            }
            InterchangeEvent::CounterpartLockRecorded {
                trade_index,
                btc_lock_id,
                ..
            } => {
                if let Some(record) = self.htlcs.iter_mut().find(|r| r.trade_index == *trade_index)
                {
                    record.btc_lock_id = Some(*btc_lock_id);
                }
            }
            InterchangeEvent::SecretRevealed { trade_index, .. } => {
                if !self.revealed.contains(trade_index) {
                    self.revealed.push(*trade_index);
                }
            }
        }
    }

    /// Record at a trade index.
    pub fn record(&self, trade_index: TradeIndex) -> Option<&HtlcRecord> {
        self.htlcs.iter().find(|r| r.trade_index == trade_index)
    }

    /// Serializable view with the base secret withheld.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.insert("baseSecret".into(), serde_json::Value::String("***".into()));
        }
        value
    }
}
