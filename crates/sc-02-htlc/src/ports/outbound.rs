//! # Outbound Ports
//!
//! The chain side of a lock. Each adapter is authoritative for the funds it
//! holds; the coordinator records state only after the adapter confirms.

use crate::domain::{EscrowReceipt, HtlcError, Lock, LockId, LockParams, Participant, Utxo};
use async_trait::async_trait;
use shared_types::{ChainId, U256};

/// Escrow primitive of one chain - outbound port.
#[async_trait]
pub trait ChainEscrow: Send + Sync {
    /// Chain served by this adapter.
    fn chain(&self) -> ChainId;

    /// Move `params.amount` from the sender into escrow for `lock_id`.
    async fn escrow(
        &self,
        lock_id: LockId,
        params: &LockParams,
    ) -> Result<EscrowReceipt, HtlcError>;

    /// Pay the escrow to the recipient, publishing the preimage.
    async fn release(&self, lock: &Lock, preimage: &[u8]) -> Result<(), HtlcError>;

    /// Pay the escrow back to the sender.
    async fn reclaim(&self, lock: &Lock) -> Result<(), HtlcError>;

    /// Spendable balance of a participant.
    async fn balance(&self, who: &Participant) -> Result<U256, HtlcError>;

    /// Preimage published when `lock_id` was released.
    async fn revealed_preimage(&self, lock_id: LockId) -> Result<Option<Vec<u8>>, HtlcError>;

    /// Unspent outputs of a participant. UTXO chains only.
    async fn utxos(&self, _who: &Participant) -> Result<Vec<Utxo>, HtlcError> {
        Err(HtlcError::Unsupported(self.chain(), "utxo listing"))
    }
}
