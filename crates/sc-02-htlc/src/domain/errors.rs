//! # Domain Errors
//!
//! Error types for the HTLC Coordinator.

use super::value_objects::{LockId, LockState};
use shared_types::{short_hex, ChainId, Classify, ErrorClass, Timestamp, U256};
use thiserror::Error;

/// HTLC error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtlcError {
    /// Amount is zero or does not fit the chain's unit.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Timelock not in the future.
    #[error("Timelock in the past: {timelock} <= now {now}")]
    TimelockInPast {
        /// Requested timelock
        timelock: Timestamp,
        /// Coordinator time
        now: Timestamp,
    },

    /// Timelock cannot be expressed on the chain.
    #[error("Timelock out of range on {chain}: {timelock}")]
    TimelockOutOfRange {
        /// Target chain
        chain: ChainId,
        /// Requested timelock
        timelock: Timestamp,
    },

    /// Sender or recipient malformed.
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),

    /// Participant belongs to another chain than the lock.
    #[error("Chain mismatch: expected {expected}, got {got}")]
    ChainMismatch {
        /// Lock chain
        expected: ChainId,
        /// Participant chain
        got: ChainId,
    },

    /// Operation not available on this chain.
    #[error("Unsupported on {0}: {1}")]
    Unsupported(ChainId, &'static str),

    /// Unknown lock id.
    #[error("Lock not found: {}", short_hex(.0))]
    LockNotFound(LockId),

    /// Preimage does not hash to the committed value.
    #[error("Hash mismatch on {chain} lock {}", short_hex(.lock_id))]
    HashMismatch {
        /// Lock id
        lock_id: LockId,
        /// Chain whose hash function was applied
        chain: ChainId,
    },

    /// Lock already Withdrawn or Refunded.
    #[error("Lock {} already terminal: {state}", short_hex(.lock_id))]
    AlreadyTerminal {
        /// Lock id
        lock_id: LockId,
        /// State found
        state: LockState,
    },

    /// Refund before the timelock.
    #[error("Lock {} not expired: timelock {timelock}, now {now}", short_hex(.lock_id))]
    NotExpired {
        /// Lock id
        lock_id: LockId,
        /// Lock timelock
        timelock: Timestamp,
        /// Coordinator time
        now: Timestamp,
    },

    /// Paired locks commit to different hashes.
    #[error("Paired locks must share one hash lock")]
    PairHashMismatch,

    /// Paired locks on the same chain.
    #[error("Paired locks must span both chains, both on {0}")]
    PairSameChain(ChainId),

    /// Second-claimed leg does not expire after the first-claimed leg.
    #[error("Invalid timelock ordering: later leg {later} must exceed earlier leg {earlier} + margin {margin}")]
    TimelockOrdering {
        /// Timelock of the leg claimed second
        later: Timestamp,
        /// Timelock of the leg claimed first
        earlier: Timestamp,
        /// Required margin in seconds
        margin: u64,
    },

    /// Sender custody cannot cover the escrow.
    #[error("Insufficient funds on {chain}: need {needed}, have {available}")]
    InsufficientFunds {
        /// Chain
        chain: ChainId,
        /// Amount required
        needed: U256,
        /// Amount available
        available: U256,
    },

    /// Chain backend failed.
    #[error("{chain} chain unavailable: {reason}")]
    ChainUnavailable {
        /// Chain
        chain: ChainId,
        /// Backend message
        reason: String,
    },
}

impl Classify for HtlcError {
    fn class(&self) -> ErrorClass {
        match self {
            HtlcError::InvalidAmount(_)
            | HtlcError::TimelockInPast { .. }
            | HtlcError::TimelockOutOfRange { .. }
            | HtlcError::InvalidParticipant(_)
            | HtlcError::ChainMismatch { .. }
            | HtlcError::Unsupported(..)
            | HtlcError::LockNotFound(_)
            | HtlcError::PairHashMismatch
            | HtlcError::PairSameChain(_)
            | HtlcError::TimelockOrdering { .. } => ErrorClass::Validation,
            HtlcError::HashMismatch { .. } => ErrorClass::HashMismatch,
            HtlcError::AlreadyTerminal { .. } | HtlcError::NotExpired { .. } => {
                ErrorClass::StateConflict
            }
            HtlcError::InsufficientFunds { .. } => ErrorClass::LiquidityShortfall,
            HtlcError::ChainUnavailable { .. } => ErrorClass::ChainUnavailable,
        }
    }
}
