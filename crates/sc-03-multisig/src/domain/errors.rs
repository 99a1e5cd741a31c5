//! # Domain Errors
//!
//! Error types for the Multisig Gatekeeper. Duplicate confirmations and
//! repeated executions are ordinary values here, never panics.

use super::value_objects::{SignerId, TxId};
use shared_types::{Address, Classify, ErrorClass};
use thiserror::Error;

/// Multisig error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultisigError {
    /// Owner set failed validation.
    #[error("Invalid owner set: {0}")]
    InvalidOwnerSet(String),

    /// Caller is not an owner.
    #[error("Unknown signer: 0x{}", hex::encode(.0))]
    UnknownSigner(SignerId),

    /// No target registered at the destination.
    #[error("Unknown destination: 0x{}", hex::encode(.0))]
    UnknownDestination(Address),

    /// Unknown transaction id.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TxId),

    /// Signer already in the confirmation set.
    #[error("Transaction {tx_id} already confirmed by 0x{}", hex::encode(.signer))]
    AlreadyConfirmed {
        /// Transaction
        tx_id: TxId,
        /// Signer
        signer: SignerId,
    },

    /// Revoking a confirmation that was never given.
    #[error("Transaction {tx_id} not confirmed by 0x{}", hex::encode(.signer))]
    NotConfirmed {
        /// Transaction
        tx_id: TxId,
        /// Signer
        signer: SignerId,
    },

    /// The one-shot gate has already fired.
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(TxId),

    /// Threshold not reached.
    #[error("Transaction {tx_id} has {have}/{need} confirmations")]
    InsufficientConfirmations {
        /// Transaction
        tx_id: TxId,
        /// Confirmations present
        have: usize,
        /// Threshold
        need: usize,
    },
}

impl Classify for MultisigError {
    fn class(&self) -> ErrorClass {
        match self {
            MultisigError::InvalidOwnerSet(_)
            | MultisigError::UnknownSigner(_)
            | MultisigError::UnknownDestination(_)
            | MultisigError::TransactionNotFound(_) => ErrorClass::Validation,
            MultisigError::AlreadyConfirmed { .. }
            | MultisigError::NotConfirmed { .. }
            | MultisigError::AlreadyExecuted(_)
            | MultisigError::InsufficientConfirmations { .. } => ErrorClass::StateConflict,
        }
    }
}
