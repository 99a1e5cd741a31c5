//! # Domain Errors
//!
//! Error types for the Secret Bridge.

use super::value_objects::{BuyIntentId, SecretPolicy, TradeIndex};
use shared_types::{Classify, ErrorClass};
use thiserror::Error;

/// Secret bridge error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No document seeded for the buy intent.
    #[error("Batch {0} not seeded")]
    NotSeeded(BuyIntentId),

    /// Re-seeding with a different policy.
    #[error("Batch {buy_intent_id} seeded with {existing}, requested {requested}")]
    PolicyMismatch {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Policy on record
        existing: SecretPolicy,
        /// Policy requested
        requested: SecretPolicy,
    },

    /// No lock recorded at this trade index.
    #[error("Batch {buy_intent_id} has no lock at trade {trade_index}")]
    TradeNotRecorded {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Trade index
        trade_index: TradeIndex,
    },

    /// A different lock is already recorded at this trade index.
    #[error("Batch {buy_intent_id} trade {trade_index} already records another lock")]
    LockRecordConflict {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Trade index
        trade_index: TradeIndex,
    },

    /// Reveal requested before the counterpart leg is funded.
    #[error("Counterpart of batch {buy_intent_id} trade {trade_index} is not escrowed")]
    CounterpartNotEscrowed {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// Trade index
        trade_index: TradeIndex,
    },

    /// A hash in the document does not derive from the base secret.
    #[error("Batch {buy_intent_id} document drift: {detail}")]
    DocumentDrift {
        /// Batch
        buy_intent_id: BuyIntentId,
        /// What differs
        detail: String,
    },

    /// Counterpart query failed.
    #[error("Counterpart unavailable: {0}")]
    CounterpartUnavailable(String),

    /// Interchange log could not be read or written.
    #[error("Interchange storage error: {0}")]
    Storage(String),
}

impl Classify for BridgeError {
    fn class(&self) -> ErrorClass {
        match self {
            BridgeError::NotSeeded(_) | BridgeError::TradeNotRecorded { .. } => {
                ErrorClass::Validation
            }
            BridgeError::PolicyMismatch { .. }
            | BridgeError::LockRecordConflict { .. }
            | BridgeError::CounterpartNotEscrowed { .. } => ErrorClass::StateConflict,
            BridgeError::DocumentDrift { .. } => ErrorClass::HashMismatch,
            BridgeError::CounterpartUnavailable(_) | BridgeError::Storage(_) => {
                ErrorClass::ChainUnavailable
            }
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Storage(format!("malformed interchange entry: {}", err))
    }
}
