//! Intent ledger as a multisig call target.
//!
//! Sell intents are created here with the multisig as seller. The attached
//! value must equal the ETH offered; it stays in the wallet's custody until
//! each trade's lock draws from it.

use super::{call_failure, decode_failure, reject_value};
use async_trait::async_trait;
use sc_01_intent_matching::{IntentApi, SellIntentSpec, TradeId};
use sc_03_multisig::{CallContext, CallFailure, TransactionTarget};
use serde::{Deserialize, Serialize};
use shared_types::{hex_serde, ErrorClass, Hash, Satoshi, Timestamp, U256};
use std::sync::Arc;
use tracing::debug;

/// Payloads understood by [`IntentTarget`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum IntentCall {
    /// Offer custody ETH for BTC. Payable: value must equal `sell_amount_eth`.
    #[serde(rename_all = "camelCase")]
    CreateSellIntent {
        /// ETH offered, in wei.
        sell_amount_eth: U256,
        /// Minimum BTC for the whole amount.
        min_buy_amount_btc: Satoshi,
        /// Matching ignores the intent after this.
        deadline: Timestamp,
        /// Off-chain label.
        label: String,
    },
    /// Link a matched trade to its ETH lock.
    #[serde(rename_all = "camelCase")]
    AssociateLock {
        /// Trade
        trade_id: TradeId,
        /// ETH lock
        #[serde(with = "hex_serde")]
        lock_id: Hash,
    },
}

impl IntentCall {
    /// Payload bytes for a multisig submission.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Dispatches [`IntentCall`] payloads to the ledger.
pub struct IntentTarget {
    intents: Arc<dyn IntentApi>,
}

impl IntentTarget {
    /// Wrap a ledger.
    pub fn new(intents: Arc<dyn IntentApi>) -> Self {
        Self { intents }
    }
}

#[async_trait]
impl TransactionTarget for IntentTarget {
    async fn invoke(
        &self,
        context: CallContext,
        payload: &[u8],
    ) -> Result<serde_json::Value, CallFailure> {
        let call: IntentCall = serde_json::from_slice(payload).map_err(decode_failure)?;
        match call {
            IntentCall::CreateSellIntent {
                sell_amount_eth,
                min_buy_amount_btc,
                deadline,
                label,
            } => {
                if context.value != sell_amount_eth {
                    return Err(CallFailure::new(
                        ErrorClass::Validation,
                        format!(
                            "attached value {} does not match sell amount {}",
                            context.value, sell_amount_eth
                        ),
                    ));
                }
                debug!(
                    "[runtime] multisig tx {} -> intents.createSellIntent({} wei)",
                    context.tx_id, sell_amount_eth
                );
                let id = self
                    .intents
                    .submit_sell_intent(SellIntentSpec {
                        seller: context.caller,
                        sell_amount_eth,
                        min_buy_amount_btc,
                        deadline,
                        offchain_label: label,
                    })
                    .await
                    .map_err(call_failure)?;
                Ok(serde_json::json!({ "sellIntentId": id }))
            }
            IntentCall::AssociateLock { trade_id, lock_id } => {
                reject_value(&context)?;
                debug!(
                    "[runtime] multisig tx {} -> intents.associateLock({})",
                    context.tx_id, trade_id
                );
                self.intents
                    .associate_lock(trade_id, lock_id)
                    .await
                    .map_err(call_failure)?;
                Ok(serde_json::json!({
                    "tradeId": trade_id,
                    "lockId": format!("0x{}", hex::encode(lock_id)),
                }))
            }
        }
    }
}
