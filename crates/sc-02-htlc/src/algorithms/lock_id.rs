//! Lock identifier derivation.

use crate::domain::{LockId, LockParams};
use shared_types::keccak256;

/// keccak256 over the chain tag, both parties, the hash lock, the timelock,
/// the amount and a coordinator nonce.
///
/// The nonce keeps two otherwise identical locks apart.
pub fn derive_lock_id(params: &LockParams, nonce: u64) -> LockId {
    let mut buf = Vec::with_capacity(256);
    buf.push(params.chain.tag());
    buf.extend_from_slice(&params.sender.to_bytes());
    buf.extend_from_slice(&params.recipient.to_bytes());
    buf.extend_from_slice(&params.hash_lock.keccak256);
    buf.extend_from_slice(&params.hash_lock.sha256);
    buf.extend_from_slice(&params.timelock.to_be_bytes());
    let mut amount = [0u8; 32];
    params.amount.to_big_endian(&mut amount);
    buf.extend_from_slice(&amount);
    buf.extend_from_slice(&nonce.to_be_bytes());
    keccak256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Participant;
    use shared_types::{ChainId, HashLock, U256};

    fn params() -> LockParams {
        LockParams {
            chain: ChainId::Eth,
            sender: Participant::Eth([1u8; 20]),
            recipient: Participant::Eth([2u8; 20]),
            hash_lock: HashLock::of(b"secret"),
            timelock: 1_700_003_600,
            amount: U256::from(5u64),
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(derive_lock_id(&params(), 0), derive_lock_id(&params(), 0));
    }

    #[test]
    fn test_nonce_and_fields_change_id() {
        let base = derive_lock_id(&params(), 0);
        assert_ne!(base, derive_lock_id(&params(), 1));

        let mut other = params();
        other.amount = U256::from(6u64);
        assert_ne!(base, derive_lock_id(&other, 0));
    }
}
