//! # Domain Errors
//!
//! Error types for the Intent Ledger.

use super::value_objects::{IntentId, IntentStatus, Side, TradeId};
use shared_types::{Address, Classify, ErrorClass, Hash, Timestamp};
use thiserror::Error;

/// Intent ledger error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// An amount field is zero.
    #[error("Invalid amount: {field} must be greater than zero")]
    InvalidAmount {
        /// Offending field
        field: &'static str,
    },

    /// Slippage above 100%.
    #[error("Invalid slippage: {0} bps exceeds 10000")]
    InvalidSlippage(u16),

    /// Deadline already passed at submission.
    #[error("Deadline in the past: {deadline} <= now {now}")]
    DeadlineInPast {
        /// Supplied deadline
        deadline: Timestamp,
        /// Ledger time
        now: Timestamp,
    },

    /// Zero address supplied as owner.
    #[error("Invalid {0:?} owner: zero address")]
    ZeroAddress(Side),

    /// Sell intents are restricted to the market maker.
    #[error("Seller 0x{} is not the market maker", hex::encode(.0))]
    NotMarketMaker(Address),

    /// Unknown intent id.
    #[error("{side:?} intent not found: {id}")]
    IntentNotFound {
        /// Side searched
        side: Side,
        /// Requested id
        id: IntentId,
    },

    /// Unknown trade id.
    #[error("Trade not found: {0}")]
    TradeNotFound(TradeId),

    /// Buy intent locktime has passed.
    #[error("Buy intent {id} expired at {locktime} (now {now})")]
    BuyIntentExpired {
        /// Buy intent id
        id: IntentId,
        /// Its locktime
        locktime: Timestamp,
        /// Ledger time
        now: Timestamp,
    },

    /// Status change not allowed.
    #[error("Invalid intent transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state
        from: IntentStatus,
        /// Attempted state
        to: IntentStatus,
    },

    /// Trade already linked to a different lock.
    #[error("Trade {trade_id} already associated with lock 0x{}", hex::encode(.existing))]
    LockAlreadyAssociated {
        /// Trade id
        trade_id: TradeId,
        /// Lock already recorded
        existing: Hash,
    },

    /// A fill would exceed an intent's original amount.
    #[error("Overfill rejected on {side:?} intent {id}")]
    Overfill {
        /// Side overfilled
        side: Side,
        /// Intent id
        id: IntentId,
    },
}

impl Classify for IntentError {
    fn class(&self) -> ErrorClass {
        match self {
            IntentError::InvalidAmount { .. }
            | IntentError::InvalidSlippage(_)
            | IntentError::DeadlineInPast { .. }
            | IntentError::ZeroAddress(_)
            | IntentError::NotMarketMaker(_)
            | IntentError::IntentNotFound { .. }
            | IntentError::TradeNotFound(_) => ErrorClass::Validation,
            IntentError::BuyIntentExpired { .. }
            | IntentError::InvalidTransition { .. }
            | IntentError::LockAlreadyAssociated { .. }
            | IntentError::Overfill { .. } => ErrorClass::StateConflict,
        }
    }
}
