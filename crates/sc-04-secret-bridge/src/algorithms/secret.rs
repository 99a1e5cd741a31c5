//! # Secret Generation and Derivation
//!
//! Base secret generation and the per-policy preimage derivation shared by
//! both legs of a trade.

use crate::domain::{
    BridgeError, InterchangeDocument, SecretPolicy, SecureSecret, TradeIndex, SECRET_LEN,
};
use rand::RngCore;
use shared_types::{short_hex, HashLock};
use zeroize::Zeroizing;

/// Generate a cryptographically secure base secret.
pub fn generate_base_secret() -> SecureSecret {
    let mut bytes = Zeroizing::new([0u8; SECRET_LEN]);
    rand::thread_rng().fill_bytes(&mut bytes[..]);
    SecureSecret::new(*bytes)
}

/// Preimage committed by trade `trade_index` of a batch.
///
/// Shared-hash batches use the base secret itself. Salted batches append the
/// trade index as 8 big-endian bytes.
pub fn preimage_for(
    base: &SecureSecret,
    policy: SecretPolicy,
    trade_index: TradeIndex,
) -> Zeroizing<Vec<u8>> {
    let mut preimage = Zeroizing::new(Vec::with_capacity(SECRET_LEN + 8));
    preimage.extend_from_slice(base.as_bytes());
    if policy == SecretPolicy::PerTradeSalted {
        preimage.extend_from_slice(&trade_index.to_be_bytes());
    }
    preimage
}

/// Hash pair committed by trade `trade_index` of a batch.
pub fn hash_lock_for(base: &SecureSecret, policy: SecretPolicy, trade_index: TradeIndex) -> HashLock {
    HashLock::of(&preimage_for(base, policy, trade_index))
}

/// Recompute every hash in the document from its base secret.
pub fn verify_document(doc: &InterchangeDocument) -> Result<(), BridgeError> {
    let base = HashLock::of(doc.base_secret.as_bytes());
    if base.keccak256 != doc.base_keccak || base.sha256 != doc.base_sha256 {
        return Err(BridgeError::DocumentDrift {
            buy_intent_id: doc.buy_intent_id,
            detail: "base hashes do not match base secret".into(),
        });
    }

    for record in &doc.htlcs {
        let expected = hash_lock_for(&doc.base_secret, doc.policy, record.trade_index);
        if expected != record.hash_lock() {
            return Err(BridgeError::DocumentDrift {
                buy_intent_id: doc.buy_intent_id,
                detail: format!(
                    "trade {} lock {} commits to a foreign hash",
                    record.trade_index,
                    short_hex(&record.lock_id)
                ),
            });
        }
    }
    Ok(())
}
