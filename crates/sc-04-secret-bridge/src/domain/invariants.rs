//! # Domain Invariants
//!
//! Checks applied before any interchange event is appended.

use super::entities::{HtlcRecord, InterchangeDocument};
use super::errors::BridgeError;
use super::value_objects::SecretPolicy;
use shared_types::HashLock;

/// A batch keeps the policy it was seeded with.
pub fn invariant_policy_stable(
    doc: &InterchangeDocument,
    requested: SecretPolicy,
) -> Result<(), BridgeError> {
    if doc.policy != requested {
        return Err(BridgeError::PolicyMismatch {
            buy_intent_id: doc.buy_intent_id,
            existing: doc.policy,
            requested,
        });
    }
    Ok(())
}

/// A record commits to the hash pair derived for its trade index.
pub fn invariant_record_commits(
    doc: &InterchangeDocument,
    record: &HtlcRecord,
    expected: &HashLock,
) -> Result<(), BridgeError> {
    if record.hash_lock() != *expected {
        return Err(BridgeError::DocumentDrift {
            buy_intent_id: doc.buy_intent_id,
            detail: format!(
                "trade {} does not commit to the {} hash",
                record.trade_index, doc.policy
            ),
        });
    }
    Ok(())
}

/// One lock per trade index. `Ok(true)` when the same lock is already there.
pub fn invariant_single_lock(
    doc: &InterchangeDocument,
    record: &HtlcRecord,
) -> Result<bool, BridgeError> {
    match doc.record(record.trade_index) {
        None => Ok(false),
        Some(existing) if existing.lock_id == record.lock_id => Ok(true),
        Some(_) => Err(BridgeError::LockRecordConflict {
            buy_intent_id: doc.buy_intent_id,
            trade_index: record.trade_index,
        }),
    }
}
