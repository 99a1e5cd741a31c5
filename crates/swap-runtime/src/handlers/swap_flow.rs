//! # Swap Flow
//!
//! Drives one buy intent's batch across the four subsystems:
//!
//! ```text
//! create_sell_intent ──→ CreateSellIntent (multisig, value = ETH offered)
//! open_batch ──→ seed secret ──→ per trade: NewLock (multisig) ──→ record ──→ AssociateLock (multisig)
//! open_btc_leg ──→ ordering check vs ETH lock ──→ BTC lock ──→ record counterpart
//! withdraw_eth ──→ reveal (BTC leg escrowed) ──→ Withdraw (multisig)
//! claim_btc ──→ preimage read back from ETH ──→ BTC withdraw
//! refund_eth / refund_btc after expiry
//! ```
//!
//! Every ETH-leg call is submitted, confirmed and executed through the
//! multisig. The BTC leg is signed by its own parties and goes direct.

use crate::adapters::{BtcCounterpart, HtlcCall, IntentCall};
use crate::container::{contracts, SwapContainer};
use sc_01_intent_matching::{IntentApi, IntentError, IntentId, MatchedTrade, Side, TradeId};
use sc_02_htlc::{HtlcApi, HtlcError, Lock, LockId, LockParams, Participant, Settlement};
use sc_03_multisig::{MultisigApi, MultisigError, SignerId, TxId};
use sc_04_secret_bridge::{
    BridgeApi, BridgeError, HtlcRecord, InterchangeDocument, SecretPolicy, TradeIndex,
};
use serde::Serialize;
use shared_types::{
    hex_serde, short_hex, Address, ChainId, Classify, ErrorClass, Hash, Satoshi, Timestamp, U256,
};
use std::sync::Arc;
use swap_telemetry::{
    log_lock_event, record_liquidity_shortfall, record_lock_created, record_lock_settled,
    record_multisig_execution,
};
use thiserror::Error;
use tracing::{info, warn};

/// Swap flow failures.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Intent ledger rejected the step.
    #[error(transparent)]
    Intent(#[from] IntentError),

    /// HTLC coordinator rejected the step.
    #[error(transparent)]
    Htlc(#[from] HtlcError),

    /// Multisig rejected the step.
    #[error(transparent)]
    Multisig(#[from] MultisigError),

    /// Secret bridge rejected the step.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Buy intent has nothing to lock.
    #[error("Buy intent {0} has no matched trades")]
    NoTrades(IntentId),

    /// A gated call needs at least one owner to submit it.
    #[error("No approvers supplied")]
    NoApprovers,

    /// Submitted but not yet executable; confirm and execute it later.
    #[error("Multisig tx {tx_id} awaiting confirmations ({have}/{need})")]
    AwaitingConfirmations {
        /// Pending transaction
        tx_id: TxId,
        /// Confirmations so far
        have: usize,
        /// Threshold
        need: usize,
    },

    /// The gate fired but the wrapped call failed.
    #[error("Multisig tx {tx_id} executed, call failed: {reason}")]
    CallFailed {
        /// Executed transaction
        tx_id: TxId,
        /// Inner failure
        reason: String,
        /// Inner failure class
        class: ErrorClass,
    },

    /// BTC leg not opened for the trade.
    #[error("Batch {buy_intent_id} trade {trade_index} has no BTC lock")]
    BtcLegMissing {
        /// Batch
        buy_intent_id: IntentId,
        /// Trade index
        trade_index: TradeIndex,
    },

    /// The interchange document holds a lock for this slot that does not
    /// belong to the trade, or that the coordinator does not know.
    #[error("Batch {buy_intent_id} trade {trade_index} has a stale lock record: {reason}")]
    StaleRecord {
        /// Batch
        buy_intent_id: IntentId,
        /// Trade index
        trade_index: TradeIndex,
        /// Mismatch found
        reason: String,
    },

    /// Nothing revealed on the ETH leg yet.
    #[error("Preimage of ETH lock {0} not revealed yet")]
    SecretNotRevealed(String),

    /// A call output or payload could not be (de)serialized.
    #[error("Payload error: {0}")]
    Payload(String),
}

impl Classify for FlowError {
    fn class(&self) -> ErrorClass {
        match self {
            FlowError::Intent(e) => e.class(),
            FlowError::Htlc(e) => e.class(),
            FlowError::Multisig(e) => e.class(),
            FlowError::Bridge(e) => e.class(),
            FlowError::NoTrades(_) | FlowError::NoApprovers | FlowError::Payload(_) => {
                ErrorClass::Validation
            }
            FlowError::AwaitingConfirmations { .. }
            | FlowError::BtcLegMissing { .. }
            | FlowError::StaleRecord { .. }
            | FlowError::SecretNotRevealed(_) => ErrorClass::StateConflict,
            FlowError::CallFailed { class, .. } => *class,
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Payload(err.to_string())
    }
}

/// Outcome of one gated call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedCall {
    /// Multisig transaction.
    pub tx_id: TxId,
    /// Output of the wrapped call.
    pub output: serde_json::Value,
}

/// What happened to one trade of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeStatus {
    /// Lock opened by this call.
    Opened,
    /// Lock already on record.
    AlreadyOpen,
    /// Nothing to lock.
    Skipped,
    /// This trade failed; the batch went on.
    Failed,
}

/// Per-trade line of a [`BatchReport`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReport {
    /// Ledger trade.
    pub trade_id: TradeId,
    /// Index within the batch.
    pub trade_index: TradeIndex,
    /// Outcome.
    pub status: TradeStatus,
    /// ETH lock, when one exists.
    #[serde(with = "hex_serde::option", skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<Hash>,
    /// Multisig transactions executed for this trade.
    pub tx_ids: Vec<TxId>,
    /// Skip reason or error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Class of the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
}

impl TradeReport {
    fn new(trade: &MatchedTrade, status: TradeStatus) -> Self {
        Self {
            trade_id: trade.trade_id,
            trade_index: trade.batch_index,
            status,
            lock_id: None,
            tx_ids: Vec::new(),
            detail: None,
            error_class: None,
        }
    }
}

/// Result of [`SwapFlow::open_batch`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Batch.
    pub buy_intent_id: IntentId,
    /// Declared secret policy.
    pub policy: SecretPolicy,
    /// keccak256 of the base secret.
    #[serde(with = "hex_serde")]
    pub base_keccak: Hash,
    /// sha256 of the base secret.
    #[serde(with = "hex_serde")]
    pub base_sha256: Hash,
    /// ETH needed for the locks still to open.
    pub required_eth: U256,
    /// Multisig custody balance before opening.
    pub available_eth: U256,
    /// Custody was below the requirement.
    pub liquidity_shortfall: bool,
    /// One line per trade, in batch order.
    pub trades: Vec<TradeReport>,
}

impl BatchReport {
    /// Trades whose lock exists after the call.
    pub fn locked(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| matches!(t.status, TradeStatus::Opened | TradeStatus::AlreadyOpen))
            .count()
    }

    /// Trades that failed.
    pub fn failed(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| t.status == TradeStatus::Failed)
            .count()
    }
}

/// Orchestrates a batch through intents, multisig, HTLCs and the bridge.
pub struct SwapFlow {
    intents: Arc<dyn IntentApi>,
    htlc: Arc<dyn HtlcApi>,
    multisig: Arc<dyn MultisigApi>,
    bridge: Arc<dyn BridgeApi>,
    counterpart: BtcCounterpart,
}

impl SwapFlow {
    /// Build over the container's subsystems.
    pub fn new(container: &SwapContainer) -> Self {
        Self {
            intents: container.intents.clone(),
            htlc: container.htlc.clone(),
            multisig: container.multisig.clone(),
            bridge: container.bridge.clone(),
            counterpart: BtcCounterpart::new(container.htlc.clone()),
        }
    }

    /// The first `threshold` owners.
    pub fn default_approvers(&self) -> Vec<SignerId> {
        let threshold = self.multisig.threshold();
        self.multisig.owners().into_iter().take(threshold).collect()
    }

    /// Submit, confirm by `approvers` and execute one call.
    ///
    /// The first approver submits and executes. When the approvers cannot
    /// reach the threshold the transaction stays pending.
    pub async fn run_gated(
        &self,
        destination: Address,
        value: U256,
        payload: Vec<u8>,
        approvers: &[SignerId],
    ) -> Result<GatedCall, FlowError> {
        let submitter = *approvers.first().ok_or(FlowError::NoApprovers)?;
        let tx_id = self
            .multisig
            .submit_transaction(submitter, destination, value, payload)?;

        let need = self.multisig.threshold();
        let mut have = 0;
        let mut seen: Vec<SignerId> = Vec::with_capacity(approvers.len());
        for signer in approvers {
            if seen.contains(signer) {
                continue;
            }
            seen.push(*signer);
            have = self.multisig.confirm_transaction(tx_id, *signer)?;
            if have >= need {
                break;
            }
        }
        if have < need {
            warn!(
                "[runtime] Multisig tx {} left pending with {}/{} confirmations",
                tx_id, have, need
            );
            return Err(FlowError::AwaitingConfirmations { tx_id, have, need });
        }

        let receipt = self.multisig.execute_transaction(tx_id, submitter).await?;
        record_multisig_execution(receipt.success);
        if !receipt.success {
            return Err(FlowError::CallFailed {
                tx_id,
                reason: receipt.error.unwrap_or_default(),
                class: receipt.error_class.unwrap_or(ErrorClass::ChainUnavailable),
            });
        }
        Ok(GatedCall {
            tx_id,
            output: receipt.output,
        })
    }

    /// Offer custody ETH on the sell book through the multisig.
    ///
    /// The wallet is the seller, so this only succeeds while it is the
    /// ledger's market maker.
    pub async fn create_sell_intent(
        &self,
        sell_amount_eth: U256,
        min_buy_amount_btc: Satoshi,
        deadline: Timestamp,
        label: String,
        approvers: &[SignerId],
    ) -> Result<(GatedCall, IntentId), FlowError> {
        let call = IntentCall::CreateSellIntent {
            sell_amount_eth,
            min_buy_amount_btc,
            deadline,
            label,
        };
        let gated = self
            .run_gated(
                contracts::INTENT_LEDGER,
                sell_amount_eth,
                call.encode()?,
                approvers,
            )
            .await?;
        let id = gated
            .output
            .get("sellIntentId")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| FlowError::Payload("sellIntentId missing from output".into()))?;
        info!(
            "[runtime] SellIntent {} created through multisig tx {}",
            id, gated.tx_id
        );
        Ok((gated, id))
    }

    /// Open the ETH lock of every matched trade of a buy intent.
    ///
    /// Safe to re-run: trades already recorded in the interchange document
    /// are reported as open, and a lock missing its ledger association gets
    /// it. A record that names another trade, another amount or a lock the
    /// coordinator does not hold fails that trade with `StaleRecord`.
    pub async fn open_batch(
        &self,
        buy_intent_id: IntentId,
        policy: SecretPolicy,
        approvers: &[SignerId],
    ) -> Result<BatchReport, FlowError> {
        self.intents
            .get_buy_intent(buy_intent_id)
            .ok_or(IntentError::IntentNotFound {
                side: Side::Buy,
                id: buy_intent_id,
            })?;
        let trades = self.intents.trades_for(buy_intent_id);
        if trades.is_empty() {
            return Err(FlowError::NoTrades(buy_intent_id));
        }
        if approvers.is_empty() {
            return Err(FlowError::NoApprovers);
        }

        let doc = self.bridge.seed_batch(buy_intent_id, policy)?;

        let required_eth = trades
            .iter()
            .filter(|t| !is_dust(t) && doc.record(t.batch_index).is_none())
            .fold(U256::zero(), |acc, t| acc.saturating_add(t.eth_amount));
        let custody = Participant::Eth(self.multisig.address());
        let available_eth = self.htlc.balance(&custody).await?;
        let liquidity_shortfall = available_eth < required_eth;
        if liquidity_shortfall {
            record_liquidity_shortfall();
            warn!(
                "[runtime] Liquidity shortfall for batch {}: custody holds {} wei, locks need {} wei; opening best effort",
                buy_intent_id, available_eth, required_eth
            );
        }

        let mut report = BatchReport {
            buy_intent_id,
            policy: doc.policy,
            base_keccak: doc.base_keccak,
            base_sha256: doc.base_sha256,
            required_eth,
            available_eth,
            liquidity_shortfall,
            trades: Vec::with_capacity(trades.len()),
        };

        for trade in &trades {
            let line = if is_dust(trade) {
                let mut line = TradeReport::new(trade, TradeStatus::Skipped);
                line.detail = Some("zero-amount trade".into());
                line
            } else {
                match self.open_trade(&doc, trade, approvers).await {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(
                            "[runtime] Batch {} trade {} failed: {}",
                            buy_intent_id, trade.batch_index, err
                        );
                        let mut line = TradeReport::new(trade, TradeStatus::Failed);
                        line.detail = Some(err.to_string());
                        line.error_class = Some(err.class());
                        line
                    }
                }
            };
            report.trades.push(line);
        }

        info!(
            "[runtime] Batch {} processed: {} locked, {} failed, {} trades",
            buy_intent_id,
            report.locked(),
            report.failed(),
            report.trades.len()
        );
        Ok(report)
    }

    async fn open_trade(
        &self,
        doc: &InterchangeDocument,
        trade: &MatchedTrade,
        approvers: &[SignerId],
    ) -> Result<TradeReport, FlowError> {
        let mut line = TradeReport::new(trade, TradeStatus::AlreadyOpen);

        let record = match doc.record(trade.batch_index) {
            Some(record) => {
                self.check_record(doc.buy_intent_id, trade, record)?;
                record.clone()
            }
            None => match self.intents.lock_for(trade.trade_id) {
                // Lock opened and associated, but never recorded.
                Some(lock_id) => {
                    let lock = self
                        .htlc
                        .get_lock(lock_id)
                        .ok_or(HtlcError::LockNotFound(lock_id))?;
                    let record = htlc_record(trade, &lock);
                    self.bridge.record_lock(doc.buy_intent_id, record.clone())?;
                    record
                }
                None => {
                    let hash_lock = self
                        .bridge
                        .hash_lock_for(doc.buy_intent_id, trade.batch_index)?;
                    let call = HtlcCall::NewLock {
                        recipient: trade.recipient,
                        hash_lock,
                        timelock: trade.locktime,
                    };
                    let gated = self
                        .run_gated(contracts::HTLC, trade.eth_amount, call.encode()?, approvers)
                        .await?;
                    let lock: Lock = serde_json::from_value(gated.output)?;
                    record_lock_created("ETH");
                    log_lock_event!(
                        info,
                        "ETH lock opened",
                        ChainId::Eth,
                        short_hex(&lock.lock_id),
                        trade_id = trade.trade_id,
                        tx_id = gated.tx_id
                    );
                    line.status = TradeStatus::Opened;
                    line.tx_ids.push(gated.tx_id);

                    let record = htlc_record(trade, &lock);
                    self.bridge.record_lock(doc.buy_intent_id, record.clone())?;
                    record
                }
            },
        };
        line.lock_id = Some(record.lock_id);

        if self.intents.lock_for(trade.trade_id).is_none() {
            let call = IntentCall::AssociateLock {
                trade_id: trade.trade_id,
                lock_id: record.lock_id,
            };
            let gated = self
                .run_gated(contracts::INTENT_LEDGER, U256::zero(), call.encode()?, approvers)
                .await?;
            line.tx_ids.push(gated.tx_id);
        }
        Ok(line)
    }

    fn check_record(
        &self,
        buy_intent_id: IntentId,
        trade: &MatchedTrade,
        record: &HtlcRecord,
    ) -> Result<(), FlowError> {
        let reason = if record.trade_id != trade.trade_id {
            format!("recorded for trade {}", record.trade_id)
        } else if record.sell_intent_id != trade.sell_intent_id {
            format!("recorded for sell intent {}", record.sell_intent_id)
        } else if record.eth_amount != trade.eth_amount {
            format!("recorded amount {} wei", record.eth_amount)
        } else if self.htlc.get_lock(record.lock_id).is_none() {
            format!("lock {} unknown to the coordinator", short_hex(&record.lock_id))
        } else {
            return Ok(());
        };
        warn!(
            "[runtime] Refusing interchange record for batch {} trade {}: {}",
            buy_intent_id, trade.batch_index, reason
        );
        Err(FlowError::StaleRecord {
            buy_intent_id,
            trade_index: trade.batch_index,
            reason,
        })
    }

    /// Open the BTC lock of a trade, expiring after its ETH lock.
    pub async fn open_btc_leg(
        &self,
        buy_intent_id: IntentId,
        trade_index: TradeIndex,
        sender: bitcoin::PublicKey,
        recipient: bitcoin::PublicKey,
        timelock: Timestamp,
    ) -> Result<Lock, FlowError> {
        let record = self.record(buy_intent_id, trade_index)?;
        if let Some(existing) = record.btc_lock_id.and_then(|id| self.htlc.get_lock(id)) {
            return Ok(existing);
        }

        let params = LockParams {
            chain: ChainId::Btc,
            sender: Participant::Btc(sender),
            recipient: Participant::Btc(recipient),
            hash_lock: record.hash_lock(),
            timelock,
            amount: U256::from(record.btc_amount),
        };
        self.htlc.check_pair_ordering(record.lock_id, &params)?;
        let lock = self.htlc.create_lock(params).await?;
        record_lock_created("BTC");
        self.bridge
            .record_counterpart_lock(buy_intent_id, trade_index, lock.lock_id)?;
        log_lock_event!(
            info,
            "BTC lock opened",
            ChainId::Btc,
            short_hex(&lock.lock_id),
            buy_intent_id = buy_intent_id,
            trade_index = trade_index
        );
        Ok(lock)
    }

    /// Reveal the trade's preimage and withdraw its ETH lock to the buyer.
    pub async fn withdraw_eth(
        &self,
        buy_intent_id: IntentId,
        trade_index: TradeIndex,
        approvers: &[SignerId],
    ) -> Result<(GatedCall, Settlement), FlowError> {
        let record = self.record(buy_intent_id, trade_index)?;
        let preimage = self
            .bridge
            .reveal_secret(buy_intent_id, trade_index, &self.counterpart)
            .await?;
        let call = HtlcCall::Withdraw {
            lock_id: record.lock_id,
            preimage: preimage.to_vec(),
        };
        let gated = self
            .run_gated(contracts::HTLC, U256::zero(), call.encode()?, approvers)
            .await?;
        let settlement: Settlement = serde_json::from_value(gated.output.clone())?;
        record_lock_settled("ETH", "withdrawn");
        Ok((gated, settlement))
    }

    /// Claim the BTC lock with the preimage published on the ETH leg.
    pub async fn claim_btc(
        &self,
        buy_intent_id: IntentId,
        trade_index: TradeIndex,
    ) -> Result<Settlement, FlowError> {
        let record = self.record(buy_intent_id, trade_index)?;
        let btc_lock_id = self.btc_lock_of(&record, buy_intent_id)?;
        let preimage = self
            .htlc
            .revealed_preimage(record.lock_id)
            .await?
            .ok_or_else(|| FlowError::SecretNotRevealed(short_hex(&record.lock_id)))?;
        let settlement = self.htlc.withdraw(btc_lock_id, &preimage).await?;
        record_lock_settled("BTC", "withdrawn");
        Ok(settlement)
    }

    /// Refund an expired ETH lock to the multisig custody.
    pub async fn refund_eth(
        &self,
        buy_intent_id: IntentId,
        trade_index: TradeIndex,
        approvers: &[SignerId],
    ) -> Result<(GatedCall, Settlement), FlowError> {
        let record = self.record(buy_intent_id, trade_index)?;
        let call = HtlcCall::Refund {
            lock_id: record.lock_id,
        };
        let gated = self
            .run_gated(contracts::HTLC, U256::zero(), call.encode()?, approvers)
            .await?;
        let settlement: Settlement = serde_json::from_value(gated.output.clone())?;
        record_lock_settled("ETH", "refunded");
        Ok((gated, settlement))
    }

    /// Refund an expired BTC lock to its sender.
    pub async fn refund_btc(
        &self,
        buy_intent_id: IntentId,
        trade_index: TradeIndex,
    ) -> Result<Settlement, FlowError> {
        let record = self.record(buy_intent_id, trade_index)?;
        let btc_lock_id = self.btc_lock_of(&record, buy_intent_id)?;
        let settlement = self.htlc.refund(btc_lock_id).await?;
        record_lock_settled("BTC", "refunded");
        Ok(settlement)
    }

    fn record(
        &self,
        buy_intent_id: IntentId,
        trade_index: TradeIndex,
    ) -> Result<HtlcRecord, FlowError> {
        let doc = self.bridge.document(buy_intent_id)?;
        doc.record(trade_index)
            .cloned()
            .ok_or(FlowError::Bridge(BridgeError::TradeNotRecorded {
                buy_intent_id,
                trade_index,
            }))
    }

    fn btc_lock_of(
        &self,
        record: &HtlcRecord,
        buy_intent_id: IntentId,
    ) -> Result<LockId, FlowError> {
        record.btc_lock_id.ok_or(FlowError::BtcLegMissing {
            buy_intent_id,
            trade_index: record.trade_index,
        })
    }
}

fn is_dust(trade: &MatchedTrade) -> bool {
    trade.eth_amount.is_zero() || trade.btc_amount == 0
}

fn htlc_record(trade: &MatchedTrade, lock: &Lock) -> HtlcRecord {
    HtlcRecord {
        trade_index: trade.batch_index,
        trade_id: trade.trade_id,
        sell_intent_id: trade.sell_intent_id,
        lock_id: lock.lock_id,
        btc_lock_id: None,
        locktime: lock.timelock,
        secret_hash_keccak: lock.hash_lock.keccak256,
        secret_hash_sha256: lock.hash_lock.sha256,
        eth_amount: lock.amount,
        btc_amount: trade.btc_amount,
        recipient: trade.recipient,
    }
}
