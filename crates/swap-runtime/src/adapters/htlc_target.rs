//! HTLC contract as a multisig call target.
//!
//! ETH-leg lock calls are only reachable through the multisig. The wallet's
//! custody address is the sender of every lock it opens.

use super::{call_failure, decode_failure, reject_value};
use async_trait::async_trait;
use sc_02_htlc::{HtlcApi, LockId, LockParams, Participant};
use sc_03_multisig::{CallContext, CallFailure, TransactionTarget};
use serde::{Deserialize, Serialize};
use shared_types::{hex_serde, Address, ChainId, ErrorClass, HashLock, Timestamp};
use std::sync::Arc;
use tracing::debug;

/// Payloads understood by [`HtlcTarget`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum HtlcCall {
    /// Escrow the attached value for `recipient`.
    #[serde(rename_all = "camelCase")]
    NewLock {
        /// ETH recipient.
        #[serde(with = "hex_serde")]
        recipient: Address,
        /// Hash pair of the trade.
        hash_lock: HashLock,
        /// Absolute expiry.
        timelock: Timestamp,
    },
    /// Release a lock against its preimage.
    #[serde(rename_all = "camelCase")]
    Withdraw {
        /// Lock
        #[serde(with = "hex_serde")]
        lock_id: LockId,
        /// Preimage
        #[serde(with = "hex_serde::vec")]
        preimage: Vec<u8>,
    },
    /// Return an expired lock to its sender.
    #[serde(rename_all = "camelCase")]
    Refund {
        /// Lock
        #[serde(with = "hex_serde")]
        lock_id: LockId,
    },
}

impl HtlcCall {
    /// Payload bytes for a multisig submission.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode payload bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            HtlcCall::NewLock { .. } => "newLock",
            HtlcCall::Withdraw { .. } => "withdraw",
            HtlcCall::Refund { .. } => "refund",
        }
    }
}

/// Dispatches [`HtlcCall`] payloads to the coordinator.
pub struct HtlcTarget {
    htlc: Arc<dyn HtlcApi>,
}

impl HtlcTarget {
    /// Wrap a coordinator.
    pub fn new(htlc: Arc<dyn HtlcApi>) -> Self {
        Self { htlc }
    }
}

#[async_trait]
impl TransactionTarget for HtlcTarget {
    async fn invoke(
        &self,
        context: CallContext,
        payload: &[u8],
    ) -> Result<serde_json::Value, CallFailure> {
        let call = HtlcCall::decode(payload).map_err(decode_failure)?;
        debug!("[runtime] multisig tx {} -> htlc.{}", context.tx_id, call.name());

        let output = match call {
            HtlcCall::NewLock {
                recipient,
                hash_lock,
                timelock,
            } => {
                let params = LockParams {
                    chain: ChainId::Eth,
                    sender: Participant::Eth(context.caller),
                    recipient: Participant::Eth(recipient),
                    hash_lock,
                    timelock,
                    amount: context.value,
                };
                let lock = self.htlc.create_lock(params).await.map_err(call_failure)?;
                serde_json::to_value(lock)
            }
            HtlcCall::Withdraw { lock_id, preimage } => {
                reject_value(&context)?;
                let settlement = self
                    .htlc
                    .withdraw(lock_id, &preimage)
                    .await
                    .map_err(call_failure)?;
                serde_json::to_value(settlement)
            }
            HtlcCall::Refund { lock_id } => {
                reject_value(&context)?;
                let settlement = self.htlc.refund(lock_id).await.map_err(call_failure)?;
                serde_json::to_value(settlement)
            }
        };
        output.map_err(|e| CallFailure::new(ErrorClass::Validation, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_02_htlc::{HtlcConfig, HtlcCoordinator, InMemoryBtcEscrow, InMemoryEthEscrow, Lock};
    use shared_types::{eth_to_wei, ManualTimeSource, U256};

    const WALLET: Address = [0x5A; 20];

    fn target() -> (HtlcTarget, Arc<InMemoryEthEscrow>) {
        let eth = Arc::new(InMemoryEthEscrow::new([0x48; 20]));
        eth.fund(WALLET, eth_to_wei(5));
        let htlc = Arc::new(HtlcCoordinator::new(
            HtlcConfig::default(),
            eth.clone(),
            Arc::new(InMemoryBtcEscrow::new(bitcoin::Network::Regtest)),
            Arc::new(ManualTimeSource::new(1_000)),
        ));
        (HtlcTarget::new(htlc), eth)
    }

    fn context(value: U256) -> CallContext {
        CallContext {
            caller: WALLET,
            value,
            tx_id: 0,
        }
    }

    #[tokio::test]
    async fn test_new_lock_escrows_attached_value() {
        let (target, eth) = target();
        let call = HtlcCall::NewLock {
            recipient: [0x0B; 20],
            hash_lock: HashLock::of(b"preimage"),
            timelock: 5_000,
        };
        let output = target
            .invoke(context(eth_to_wei(2)), &call.encode().unwrap())
            .await
            .unwrap();
        let lock: Lock = serde_json::from_value(output).unwrap();
        assert_eq!(lock.amount, eth_to_wei(2));
        assert_eq!(lock.sender, Participant::Eth(WALLET));
        assert_eq!(eth.total_escrowed(), eth_to_wei(2));
    }

    #[tokio::test]
    async fn test_failures_carry_error_class() {
        let (target, _) = target();
        let refund = HtlcCall::Refund { lock_id: [1; 32] }.encode().unwrap();
        let failure = target.invoke(context(U256::zero()), &refund).await.unwrap_err();
        assert_eq!(failure.class, ErrorClass::Validation);

        let failure = target
            .invoke(context(U256::zero()), b"{\"call\":\"selfDestruct\"}")
            .await
            .unwrap_err();
        assert!(failure.reason.contains("malformed payload"));

        let failure = target.invoke(context(U256::one()), &refund).await.unwrap_err();
        assert!(failure.reason.contains("not payable"));
    }
}
