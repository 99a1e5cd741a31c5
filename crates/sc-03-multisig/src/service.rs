//! # Multisig Wallet Service
//!
//! Each transaction sits behind its own mutex. Confirmations are set inserts
//! under that mutex; execution flips `executed` under it and releases it
//! before awaiting the destination, so concurrent executors see the flag and
//! stop at `AlreadyExecuted`.

use crate::domain::{
    invariant_confirmations_bounded, invariant_executable, invariant_is_owner, CallContext,
    CallFailure, ExecutionReceipt, MultisigError, MultisigTransaction, OwnerSet, SignerId, TxId,
};
use crate::ports::{MultisigApi, TransactionTarget};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, ErrorClass, TimeSource, U256};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

type TxSlot = Arc<Mutex<MultisigTransaction>>;

/// A k-of-n wallet gating calls to registered destinations.
pub struct MultisigWallet {
    address: Address,
    owners: OwnerSet,
    targets: RwLock<HashMap<Address, Arc<dyn TransactionTarget>>>,
    transactions: RwLock<Vec<TxSlot>>,
    time_source: Arc<dyn TimeSource>,
}

impl MultisigWallet {
    /// Create a wallet with custody at `address` and a fixed owner set.
    pub fn new(address: Address, owners: OwnerSet, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            address,
            owners,
            targets: RwLock::new(HashMap::new()),
            transactions: RwLock::new(Vec::new()),
            time_source,
        }
    }

    /// Register the target reachable at `destination`.
    pub fn register_target(&self, destination: Address, target: Arc<dyn TransactionTarget>) {
        self.targets.write().insert(destination, target);
        debug!(
            "[sc-03] Target registered at 0x{}",
            hex::encode(destination)
        );
    }

    fn slot(&self, tx_id: TxId) -> Result<TxSlot, MultisigError> {
        self.transactions
            .read()
            .get(tx_id as usize)
            .cloned()
            .ok_or(MultisigError::TransactionNotFound(tx_id))
    }
}

#[async_trait]
impl MultisigApi for MultisigWallet {
    fn submit_transaction(
        &self,
        submitter: SignerId,
        destination: Address,
        value: U256,
        payload: Vec<u8>,
    ) -> Result<TxId, MultisigError> {
        invariant_is_owner(&self.owners, &submitter)?;
        if !self.targets.read().contains_key(&destination) {
            return Err(MultisigError::UnknownDestination(destination));
        }

        let mut transactions = self.transactions.write();
        let tx_id = transactions.len() as TxId;
        transactions.push(Arc::new(Mutex::new(MultisigTransaction {
            tx_id,
            destination,
            value,
            payload,
            confirmations: BTreeSet::new(),
            executed: false,
            submitted_by: submitter,
            submitted_at: self.time_source.now(),
            receipt: None,
        })));

        info!(
            "[sc-03] Transaction {} submitted to 0x{} with value {}",
            tx_id,
            hex::encode(destination),
            value
        );
        Ok(tx_id)
    }

    fn confirm_transaction(&self, tx_id: TxId, signer: SignerId) -> Result<usize, MultisigError> {
        invariant_is_owner(&self.owners, &signer)?;
        let slot = self.slot(tx_id)?;
        let mut tx = slot.lock();

        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(tx_id));
        }
        if !tx.confirmations.insert(signer) {
            return Err(MultisigError::AlreadyConfirmed { tx_id, signer });
        }
        debug_assert!(invariant_confirmations_bounded(&tx, &self.owners));

        let count = tx.confirmation_count();
        info!(
            "[sc-03] Transaction {} confirmed by 0x{} ({}/{})",
            tx_id,
            hex::encode(signer),
            count,
            self.owners.threshold()
        );
        Ok(count)
    }

    fn revoke_confirmation(&self, tx_id: TxId, signer: SignerId) -> Result<usize, MultisigError> {
        invariant_is_owner(&self.owners, &signer)?;
        let slot = self.slot(tx_id)?;
        let mut tx = slot.lock();

        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(tx_id));
        }
        if !tx.confirmations.remove(&signer) {
            return Err(MultisigError::NotConfirmed { tx_id, signer });
        }

        info!(
            "[sc-03] Transaction {} confirmation revoked by 0x{}",
            tx_id,
            hex::encode(signer)
        );
        Ok(tx.confirmation_count())
    }

    async fn execute_transaction(
        &self,
        tx_id: TxId,
        executor: SignerId,
    ) -> Result<ExecutionReceipt, MultisigError> {
        invariant_is_owner(&self.owners, &executor)?;
        let slot = self.slot(tx_id)?;

        // The gate: check and flip under the transaction's lock.
        let (destination, value, payload) = {
            let mut tx = slot.lock();
            invariant_executable(&tx, self.owners.threshold())?;
            tx.executed = true;
            (tx.destination, tx.value, tx.payload.clone())
        };

        let target = self.targets.read().get(&destination).cloned();
        let outcome = match target {
            Some(target) => {
                let context = CallContext {
                    caller: self.address,
                    value,
                    tx_id,
                };
                target.invoke(context, &payload).await
            }
            None => Err(CallFailure::new(
                ErrorClass::Validation,
                format!("no target at 0x{}", hex::encode(destination)),
            )),
        };

        let receipt = match outcome {
            Ok(output) => ExecutionReceipt {
                executed_by: executor,
                success: true,
                output,
                error: None,
                error_class: None,
                executed_at: self.time_source.now(),
            },
            Err(failure) => {
                warn!(
                    "[sc-03] Transaction {} executed, wrapped call failed: {}",
                    tx_id, failure
                );
                ExecutionReceipt {
                    executed_by: executor,
                    success: false,
                    output: serde_json::Value::Null,
                    error: Some(failure.reason),
                    error_class: Some(failure.class),
                    executed_at: self.time_source.now(),
                }
            }
        };

        slot.lock().receipt = Some(receipt.clone());
        info!(
            "[sc-03] Transaction {} executed by 0x{} (success={})",
            tx_id,
            hex::encode(executor),
            receipt.success
        );
        Ok(receipt)
    }

    fn get_transaction(&self, tx_id: TxId) -> Option<MultisigTransaction> {
        self.slot(tx_id).ok().map(|slot| slot.lock().clone())
    }

    fn list_transactions(&self, pending_only: bool) -> Vec<MultisigTransaction> {
        self.transactions
            .read()
            .iter()
            .map(|slot| slot.lock().clone())
            .filter(|tx| !pending_only || !tx.executed)
            .collect()
    }

    fn confirmation_count(&self, tx_id: TxId) -> Result<usize, MultisigError> {
        Ok(self.slot(tx_id)?.lock().confirmation_count())
    }

    fn owners(&self) -> Vec<SignerId> {
        self.owners.owners().to_vec()
    }

    fn threshold(&self) -> usize {
        self.owners.threshold()
    }

    fn address(&self) -> Address {
        self.address
    }
}
