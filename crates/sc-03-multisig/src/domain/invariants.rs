//! # Domain Invariants
//!
//! Gate checks for confirmation and execution.

use super::entities::MultisigTransaction;
use super::errors::MultisigError;
use super::value_objects::{OwnerSet, SignerId};

/// Invariant: only owners act on the wallet.
pub fn invariant_is_owner(owners: &OwnerSet, signer: &SignerId) -> Result<(), MultisigError> {
    if !owners.contains(signer) {
        return Err(MultisigError::UnknownSigner(*signer));
    }
    Ok(())
}

/// Invariant: execution requires an unexecuted transaction at threshold.
pub fn invariant_executable(
    tx: &MultisigTransaction,
    threshold: usize,
) -> Result<(), MultisigError> {
    if tx.executed {
        return Err(MultisigError::AlreadyExecuted(tx.tx_id));
    }
    if tx.confirmation_count() < threshold {
        return Err(MultisigError::InsufficientConfirmations {
            tx_id: tx.tx_id,
            have: tx.confirmation_count(),
            need: threshold,
        });
    }
    Ok(())
}

/// Invariant: confirmations are bounded by the owner set.
pub fn invariant_confirmations_bounded(tx: &MultisigTransaction, owners: &OwnerSet) -> bool {
    tx.confirmation_count() <= owners.len() && tx.confirmations.iter().all(|s| owners.contains(s))
}
