//! # Domain Invariants
//!
//! Rules checked before escrow and before settlement.

use super::entities::{Lock, LockParams};
use super::errors::HtlcError;
use super::value_objects::LockState;
use shared_types::{ChainId, Timestamp, U256};

/// Bitcoin reads locktimes below this as block heights, not Unix times.
pub const LOCKTIME_THRESHOLD: Timestamp = 500_000_000;

/// Invariant: timelock ordering between the two legs of one trade.
///
/// The leg claimed second must expire more than `margin` seconds after the
/// leg claimed first. Its recipient learns the preimage from the first claim
/// and needs that window to claim in turn.
pub fn invariant_timelock_ordering(
    later: Timestamp,
    earlier: Timestamp,
    margin: u64,
) -> Result<(), HtlcError> {
    if later <= earlier.saturating_add(margin) {
        return Err(HtlcError::TimelockOrdering {
            later,
            earlier,
            margin,
        });
    }
    Ok(())
}

/// Invariant: paired legs share a hash lock and span both chains.
pub fn invariant_pairing(
    first_claimed: &LockParams,
    second_claimed: &LockParams,
    margin: u64,
) -> Result<(), HtlcError> {
    if first_claimed.hash_lock != second_claimed.hash_lock {
        return Err(HtlcError::PairHashMismatch);
    }
    if first_claimed.chain == second_claimed.chain {
        return Err(HtlcError::PairSameChain(first_claimed.chain));
    }
    invariant_timelock_ordering(second_claimed.timelock, first_claimed.timelock, margin)
}

/// Invariant: the preimage hashes to the lock's commitment under the lock
/// chain's hash function.
pub fn invariant_preimage_matches(lock: &Lock, preimage: &[u8]) -> Result<(), HtlcError> {
    if !lock.hash_lock.matches(lock.chain, preimage) {
        return Err(HtlcError::HashMismatch {
            lock_id: lock.lock_id,
            chain: lock.chain,
        });
    }
    Ok(())
}

/// Invariant: only a Locked lock settles.
pub fn invariant_settleable(lock: &Lock, next: LockState) -> Result<(), HtlcError> {
    if !lock.state.can_transition_to(next) {
        return Err(HtlcError::AlreadyTerminal {
            lock_id: lock.lock_id,
            state: lock.state,
        });
    }
    Ok(())
}

/// Invariant: parameters describe a lock the chain can hold.
pub fn invariant_valid_params(params: &LockParams, now: Timestamp) -> Result<(), HtlcError> {
    if params.amount.is_zero() {
        return Err(HtlcError::InvalidAmount("amount must be positive".into()));
    }
    if params.timelock <= now {
        return Err(HtlcError::TimelockInPast {
            timelock: params.timelock,
            now,
        });
    }
    for party in [&params.sender, &params.recipient] {
        if party.chain() != params.chain {
            return Err(HtlcError::ChainMismatch {
                expected: params.chain,
                got: party.chain(),
            });
        }
        party.validate()?;
    }
    if params.sender == params.recipient {
        return Err(HtlcError::InvalidParticipant(
            "sender and recipient are the same".into(),
        ));
    }
    if params.chain == ChainId::Btc {
        if params.amount > U256::from(u64::MAX) {
            return Err(HtlcError::InvalidAmount(format!(
                "{} exceeds satoshi range",
                params.amount
            )));
        }
        if params.timelock < LOCKTIME_THRESHOLD || params.timelock > u64::from(u32::MAX) {
            return Err(HtlcError::TimelockOutOfRange {
                chain: params.chain,
                timelock: params.timelock,
            });
        }
    }
    Ok(())
}
