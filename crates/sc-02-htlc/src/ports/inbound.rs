//! # Inbound Ports
//!
//! API trait defining what the HTLC Coordinator can do.

use crate::domain::{HtlcError, Lock, LockId, LockParams, Participant, Settlement, Utxo};
use async_trait::async_trait;
use shared_types::{ChainId, U256};

/// HTLC Coordinator API - inbound port.
#[async_trait]
pub trait HtlcApi: Send + Sync {
    /// Validate, escrow from `params.sender` and record a Locked lock.
    async fn create_lock(&self, params: LockParams) -> Result<Lock, HtlcError>;

    /// Create both legs of one trade.
    ///
    /// `first_claimed` is the leg whose withdraw reveals the preimage; it must
    /// expire before `second_claimed`.
    async fn create_lock_pair(
        &self,
        first_claimed: LockParams,
        second_claimed: LockParams,
    ) -> Result<(Lock, Lock), HtlcError>;

    /// Release to the recipient against the preimage.
    async fn withdraw(&self, lock_id: LockId, preimage: &[u8]) -> Result<Settlement, HtlcError>;

    /// Return to the sender once the timelock is reached.
    async fn refund(&self, lock_id: LockId) -> Result<Settlement, HtlcError>;

    /// Check a leg about to be opened against the existing first-claimed leg.
    fn check_pair_ordering(
        &self,
        first_claimed: LockId,
        second_claimed: &LockParams,
    ) -> Result<(), HtlcError>;

    /// Get a lock.
    fn get_lock(&self, lock_id: LockId) -> Option<Lock>;

    /// All locks, optionally restricted to one chain, in creation order.
    fn list_locks(&self, chain: Option<ChainId>) -> Vec<Lock>;

    /// Preimage published on chain by a withdraw of this lock.
    async fn revealed_preimage(&self, lock_id: LockId) -> Result<Option<Vec<u8>>, HtlcError>;

    /// Spendable balance of a participant on its chain.
    async fn balance(&self, who: &Participant) -> Result<U256, HtlcError>;

    /// Unspent outputs of a BTC participant.
    async fn utxos(&self, who: &Participant) -> Result<Vec<Utxo>, HtlcError>;
}
