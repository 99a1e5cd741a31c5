//! # Inbound Ports
//!
//! API trait defining what the Multisig Gatekeeper can do.

use crate::domain::{ExecutionReceipt, MultisigError, MultisigTransaction, SignerId, TxId};
use async_trait::async_trait;
use shared_types::{Address, U256};

/// Multisig Gatekeeper API - inbound port.
#[async_trait]
pub trait MultisigApi: Send + Sync {
    /// Record a call with an empty confirmation set.
    fn submit_transaction(
        &self,
        submitter: SignerId,
        destination: Address,
        value: U256,
        payload: Vec<u8>,
    ) -> Result<TxId, MultisigError>;

    /// Add `signer` to the confirmation set. Returns the new count.
    fn confirm_transaction(&self, tx_id: TxId, signer: SignerId) -> Result<usize, MultisigError>;

    /// Remove `signer` from the confirmation set. Returns the new count.
    fn revoke_confirmation(&self, tx_id: TxId, signer: SignerId) -> Result<usize, MultisigError>;

    /// Fire the one-shot gate and run the call against its destination.
    ///
    /// `Ok` means the gate fired; the receipt carries the call's own outcome.
    async fn execute_transaction(
        &self,
        tx_id: TxId,
        executor: SignerId,
    ) -> Result<ExecutionReceipt, MultisigError>;

    /// Get a transaction.
    fn get_transaction(&self, tx_id: TxId) -> Option<MultisigTransaction>;

    /// Transactions in id order, optionally only unexecuted ones.
    fn list_transactions(&self, pending_only: bool) -> Vec<MultisigTransaction>;

    /// Distinct confirmations of a transaction.
    fn confirmation_count(&self, tx_id: TxId) -> Result<usize, MultisigError>;

    /// Owners in declaration order.
    fn owners(&self) -> Vec<SignerId>;

    /// Confirmations required to execute.
    fn threshold(&self) -> usize;

    /// Custody address of the wallet.
    fn address(&self) -> Address;
}
