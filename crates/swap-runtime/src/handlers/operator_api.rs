//! # Operator API
//!
//! Request/response contract consumed by the UI and CLI. Every request is
//! `{ "method", "params" }`; every reply is `{ "success", "output", "payload" }`
//! where `output` is a human-readable line and `payload` the structured
//! result (ids, hashes, amounts, resulting state).
//!
//! Amounts are `0x`-hex wei or satoshi, addresses and hashes `0x`-hex, BTC
//! keys compressed SEC hex.

use super::swap_flow::SwapFlow;
use crate::container::SwapContainer;
use sc_01_intent_matching::{BuyIntentSpec, IntentApi, IntentId, SellIntentSpec, Side};
use sc_02_htlc::{HtlcApi, HtlcError, LockId, Participant};
use sc_03_multisig::{MultisigApi, SignerId, TxId};
use sc_04_secret_bridge::{BridgeApi, SecretPolicy, TradeIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{
    hex_serde, parse_address, short_hex, Address, ChainId, Classify, ErrorClass, Satoshi, Timestamp,
    U256,
};
use std::fmt::Display;
use std::sync::Arc;
use swap_telemetry::{
    record_intent_submitted, record_multisig_execution, record_operator_request,
    record_trades_matched, subsystem_span,
};
use tracing::{debug, warn, Instrument};

/// Incoming operator request.
#[derive(Clone, Debug, Deserialize)]
pub struct OperatorRequest {
    /// Method name, e.g. `intent_submitBuy`.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// Reply to an operator request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperatorResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable result or error.
    pub output: String,
    /// Structured result.
    pub payload: Value,
}

/// A failed request.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Class of the failure.
    pub class: ErrorClass,
    /// Message.
    pub message: String,
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Validation,
            message: message.into(),
        }
    }
}

fn api_err<E: Classify + Display>(err: E) -> ApiError {
    ApiError {
        class: err.class(),
        message: err.to_string(),
    }
}

struct Reply {
    success: bool,
    output: String,
    payload: Value,
}

impl Reply {
    fn ok(output: impl Into<String>, payload: Value) -> Self {
        Self {
            success: true,
            output: output.into(),
            payload,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchParams {
    buy_intent_id: IntentId,
    #[serde(default, with = "hex_serde::option")]
    executor: Option<Address>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SellParams {
    /// Direct submission as this seller; through the multisig when absent
    /// or when it names the custody wallet.
    #[serde(default, with = "hex_serde::option")]
    seller: Option<Address>,
    sell_amount_eth: U256,
    min_buy_amount_btc: Satoshi,
    deadline: Timestamp,
    #[serde(default)]
    label: String,
    #[serde(default)]
    approvers: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelParams {
    side: Side,
    id: IntentId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyIntentParams {
    buy_intent_id: IntentId,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListTxParams {
    #[serde(default)]
    pending_only: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmParams {
    tx_id: TxId,
    #[serde(with = "hex_serde")]
    signer: SignerId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteParams {
    tx_id: TxId,
    #[serde(with = "hex_serde")]
    executor: SignerId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenBatchParams {
    buy_intent_id: IntentId,
    policy: SecretPolicy,
    #[serde(default)]
    approvers: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BtcLegParams {
    buy_intent_id: IntentId,
    trade_index: TradeIndex,
    sender: bitcoin::PublicKey,
    recipient: bitcoin::PublicKey,
    timelock: Timestamp,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeParams {
    buy_intent_id: IntentId,
    trade_index: TradeIndex,
    #[serde(default)]
    approvers: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefundParams {
    buy_intent_id: IntentId,
    trade_index: TradeIndex,
    chain: ChainId,
    #[serde(default)]
    approvers: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListLocksParams {
    #[serde(default)]
    chain: Option<ChainId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockParamsById {
    #[serde(with = "hex_serde")]
    lock_id: LockId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundParams {
    participant: Participant,
    amount: U256,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantParams {
    participant: Participant,
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, ApiError> {
    serde_json::from_value(params).map_err(|e| ApiError::invalid(format!("invalid params: {}", e)))
}

fn parse_or_default<T: DeserializeOwned + Default>(params: Value) -> Result<T, ApiError> {
    if params.is_null() {
        return Ok(T::default());
    }
    parse(params)
}

fn to_payload<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::invalid(e.to_string()))
}

fn hex_id(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Dispatches operator requests onto the subsystems.
pub struct OperatorApi {
    container: Arc<SwapContainer>,
    flow: SwapFlow,
}

impl OperatorApi {
    /// Serve requests against a container.
    pub fn new(container: Arc<SwapContainer>) -> Self {
        let flow = SwapFlow::new(&container);
        Self { container, flow }
    }

    /// The swap flow driven by `htlc_*` methods.
    pub fn flow(&self) -> &SwapFlow {
        &self.flow
    }

    /// Handle one request. Never fails; errors become `success: false`.
    pub async fn handle(&self, request: OperatorRequest) -> OperatorResponse {
        let span = subsystem_span!("operator_request", method = %request.method);
        let method = request.method.clone();
        let result = self
            .route_method(&request.method, request.params)
            .instrument(span)
            .await;

        let response = match result {
            Ok(reply) => OperatorResponse {
                success: reply.success,
                output: reply.output,
                payload: reply.payload,
            },
            Err(err) => {
                warn!("[runtime] {} failed ({:?}): {}", method, err.class, err.message);
                OperatorResponse {
                    success: false,
                    output: err.message,
                    payload: json!({ "errorClass": err.class }),
                }
            }
        };
        record_operator_request(&method, response.success);
        response
    }

    fn approvers(&self, raw: Option<Vec<String>>) -> Result<Vec<SignerId>, ApiError> {
        match raw {
            None => Ok(self.flow.default_approvers()),
            Some(list) => list
                .iter()
                .map(|s| {
                    parse_address(s).ok_or_else(|| ApiError::invalid(format!("bad approver {}", s)))
                })
                .collect(),
        }
    }

    async fn route_method(&self, method: &str, params: Value) -> Result<Reply, ApiError> {
        debug!("[runtime] operator request {}", method);
        let c = &self.container;

        match method {
            // ═══════════════════════════════════════════════════════════════
            // INTENTS
            // ═══════════════════════════════════════════════════════════════
            "intent_submitBuy" => {
                let spec: BuyIntentSpec = parse(params)?;
                let id = c.intents.submit_buy_intent(spec).await.map_err(api_err)?;
                record_intent_submitted(Side::Buy.label());
                Ok(Reply::ok(format!("Buy intent {} submitted", id), json!({ "id": id })))
            }

            "intent_submitSell" => {
                let p: SellParams = parse(params)?;
                let custody = c.multisig.address();
                let (id, tx_id) = match p.seller.filter(|seller| *seller != custody) {
                    Some(seller) => {
                        let spec = SellIntentSpec {
                            seller,
                            sell_amount_eth: p.sell_amount_eth,
                            min_buy_amount_btc: p.min_buy_amount_btc,
                            deadline: p.deadline,
                            offchain_label: p.label,
                        };
                        let id = c.intents.submit_sell_intent(spec).await.map_err(api_err)?;
                        (id, None)
                    }
                    None => {
                        let approvers = self.approvers(p.approvers)?;
                        let (gated, id) = self
                            .flow
                            .create_sell_intent(
                                p.sell_amount_eth,
                                p.min_buy_amount_btc,
                                p.deadline,
                                p.label,
                                &approvers,
                            )
                            .await
                            .map_err(api_err)?;
                        (id, Some(gated.tx_id))
                    }
                };
                record_intent_submitted(Side::Sell.label());
                Ok(Reply::ok(
                    format!("Sell intent {} submitted", id),
                    json!({ "id": id, "txId": tx_id }),
                ))
            }

            "intent_match" => {
                let p: MatchParams = parse(params)?;
                let executor = p.executor.unwrap_or_else(|| c.multisig.address());
                let trades = c
                    .intents
                    .match_intent(p.buy_intent_id, executor)
                    .await
                    .map_err(api_err)?;
                record_trades_matched(trades.len());
                Ok(Reply::ok(
                    format!(
                        "{} trade(s) matched for buy intent {}",
                        trades.len(),
                        p.buy_intent_id
                    ),
                    to_payload(&trades)?,
                ))
            }

            "intent_cancel" => {
                let p: CancelParams = parse(params)?;
                let status = c.intents.cancel_intent(p.side, p.id).await.map_err(api_err)?;
                Ok(Reply::ok(
                    format!("{} intent {} cancelled", p.side.label(), p.id),
                    json!({ "id": p.id, "status": status }),
                ))
            }

            "intent_list" => {
                let snapshot = c.intents.list_intents();
                Ok(Reply::ok(
                    format!(
                        "{} buy / {} sell intents",
                        snapshot.buy_intents.len(),
                        snapshot.sell_intents.len()
                    ),
                    to_payload(&snapshot)?,
                ))
            }

            "intent_trades" => {
                let p: BuyIntentParams = parse(params)?;
                let trades = c.intents.trades_for(p.buy_intent_id);
                let mut rows = Vec::with_capacity(trades.len());
                for trade in &trades {
                    let mut row = to_payload(trade)?;
                    if let (Some(obj), Some(lock_id)) =
                        (row.as_object_mut(), c.intents.lock_for(trade.trade_id))
                    {
                        obj.insert("lockId".into(), json!(hex_id(&lock_id)));
                    }
                    rows.push(row);
                }
                Ok(Reply::ok(
                    format!("{} trade(s) for buy intent {}", rows.len(), p.buy_intent_id),
                    Value::Array(rows),
                ))
            }

            // ═══════════════════════════════════════════════════════════════
            // MULTISIG
            // ═══════════════════════════════════════════════════════════════
            "multisig_list" => {
                let p: ListTxParams = parse_or_default(params)?;
                let txs = c.multisig.list_transactions(p.pending_only);
                Ok(Reply::ok(
                    format!(
                        "{} transaction(s), threshold {} of {}",
                        txs.len(),
                        c.multisig.threshold(),
                        c.multisig.owners().len()
                    ),
                    to_payload(&txs)?,
                ))
            }

            "multisig_confirm" => {
                let p: ConfirmParams = parse(params)?;
                let count = c
                    .multisig
                    .confirm_transaction(p.tx_id, p.signer)
                    .map_err(api_err)?;
                Ok(Reply::ok(
                    format!(
                        "Tx {} confirmed by {} ({}/{})",
                        p.tx_id,
                        short_hex(&p.signer),
                        count,
                        c.multisig.threshold()
                    ),
                    json!({ "txId": p.tx_id, "confirmations": count }),
                ))
            }

            "multisig_execute" => {
                let p: ExecuteParams = parse(params)?;
                let receipt = c
                    .multisig
                    .execute_transaction(p.tx_id, p.executor)
                    .await
                    .map_err(api_err)?;
                record_multisig_execution(receipt.success);
                let output = match &receipt.error {
                    None => format!("Tx {} executed", p.tx_id),
                    Some(err) => format!("Tx {} executed, call failed: {}", p.tx_id, err),
                };
                Ok(Reply {
                    success: receipt.success,
                    output,
                    payload: to_payload(&receipt)?,
                })
            }

            // ═══════════════════════════════════════════════════════════════
            // HTLC
            // ═══════════════════════════════════════════════════════════════
            "htlc_openBatch" => {
                let p: OpenBatchParams = parse(params)?;
                let approvers = self.approvers(p.approvers)?;
                let report = self
                    .flow
                    .open_batch(p.buy_intent_id, p.policy, &approvers)
                    .await
                    .map_err(api_err)?;
                let mut output = format!(
                    "Batch {}: {} of {} trade(s) locked, {} failed",
                    report.buy_intent_id,
                    report.locked(),
                    report.trades.len(),
                    report.failed()
                );
                if report.liquidity_shortfall {
                    output.push_str(&format!(
                        ". WARNING: liquidity shortfall, custody {} wei < required {} wei",
                        report.available_eth, report.required_eth
                    ));
                }
                Ok(Reply {
                    success: report.failed() == 0 || report.locked() > 0,
                    output,
                    payload: to_payload(&report)?,
                })
            }

            "htlc_openBtcLeg" => {
                let p: BtcLegParams = parse(params)?;
                let lock = self
                    .flow
                    .open_btc_leg(
                        p.buy_intent_id,
                        p.trade_index,
                        p.sender,
                        p.recipient,
                        p.timelock,
                    )
                    .await
                    .map_err(api_err)?;
                Ok(Reply::ok(
                    format!(
                        "BTC lock {} escrowed at {}",
                        hex_id(&lock.lock_id),
                        lock.escrow.escrow_address
                    ),
                    to_payload(&lock)?,
                ))
            }

            "htlc_withdraw" => {
                let p: TradeParams = parse(params)?;
                let approvers = self.approvers(p.approvers)?;
                let (gated, settlement) = self
                    .flow
                    .withdraw_eth(p.buy_intent_id, p.trade_index, &approvers)
                    .await
                    .map_err(api_err)?;
                Ok(Reply::ok(
                    format!(
                        "ETH lock {} withdrawn via tx {}",
                        hex_id(&settlement.lock_id),
                        gated.tx_id
                    ),
                    json!({ "txId": gated.tx_id, "settlement": to_payload(&settlement)? }),
                ))
            }

            "htlc_claimBtc" => {
                let p: TradeParams = parse(params)?;
                let settlement = self
                    .flow
                    .claim_btc(p.buy_intent_id, p.trade_index)
                    .await
                    .map_err(api_err)?;
                Ok(Reply::ok(
                    format!("BTC lock {} withdrawn", hex_id(&settlement.lock_id)),
                    to_payload(&settlement)?,
                ))
            }

            "htlc_refund" => {
                let p: RefundParams = parse(params)?;
                let (tx_id, settlement) = match p.chain {
                    ChainId::Eth => {
                        let approvers = self.approvers(p.approvers)?;
                        let (gated, settlement) = self
                            .flow
                            .refund_eth(p.buy_intent_id, p.trade_index, &approvers)
                            .await
                            .map_err(api_err)?;
                        (Some(gated.tx_id), settlement)
                    }
                    ChainId::Btc => {
                        let settlement = self
                            .flow
                            .refund_btc(p.buy_intent_id, p.trade_index)
                            .await
                            .map_err(api_err)?;
                        (None, settlement)
                    }
                };
                Ok(Reply::ok(
                    format!("{} lock {} refunded", p.chain, hex_id(&settlement.lock_id)),
                    json!({ "txId": tx_id, "settlement": to_payload(&settlement)? }),
                ))
            }

            "htlc_list" => {
                let p: ListLocksParams = parse_or_default(params)?;
                let locks = c.htlc.list_locks(p.chain);
                Ok(Reply::ok(format!("{} lock(s)", locks.len()), to_payload(&locks)?))
            }

            "htlc_view" => {
                let p: LockParamsById = parse(params)?;
                let lock = c
                    .htlc
                    .get_lock(p.lock_id)
                    .ok_or_else(|| api_err(HtlcError::LockNotFound(p.lock_id)))?;
                Ok(Reply::ok(
                    format!(
                        "{} lock {} is {}",
                        lock.chain,
                        hex_id(&lock.lock_id),
                        lock.state
                    ),
                    to_payload(&lock)?,
                ))
            }

            // ═══════════════════════════════════════════════════════════════
            // BRIDGE
            // ═══════════════════════════════════════════════════════════════
            "bridge_document" => {
                let p: BuyIntentParams = parse(params)?;
                let doc = c.bridge.document(p.buy_intent_id).map_err(api_err)?;
                let drift = c.bridge.verify_document(p.buy_intent_id).err();
                let mut payload = doc.redacted();
                if let Some(obj) = payload.as_object_mut() {
                    obj.insert("verified".into(), json!(drift.is_none()));
                    if let Some(err) = &drift {
                        obj.insert("drift".into(), json!(err.to_string()));
                    }
                }
                Ok(Reply::ok(
                    format!(
                        "Batch {} ({}) with {} lock(s)",
                        doc.buy_intent_id,
                        doc.policy,
                        doc.htlcs.len()
                    ),
                    payload,
                ))
            }

            // ═══════════════════════════════════════════════════════════════
            // CHAIN
            // ═══════════════════════════════════════════════════════════════
            "chain_fund" => {
                let p: FundParams = parse(params)?;
                match p.participant {
                    Participant::Eth(address) => {
                        let balance = c.eth_chain.fund(address, p.amount);
                        Ok(Reply::ok(
                            format!("Funded {} with {} wei", hex_id(&address), p.amount),
                            json!({ "balance": balance }),
                        ))
                    }
                    Participant::Btc(key) => {
                        if p.amount > U256::from(u64::MAX) {
                            return Err(ApiError::invalid("amount exceeds satoshi range"));
                        }
                        let utxo = c.btc_chain.fund(&key, p.amount.low_u64());
                        Ok(Reply::ok(
                            format!("Funded {} with {} sat", utxo.address, utxo.value),
                            to_payload(&utxo)?,
                        ))
                    }
                }
            }

            "chain_balance" => {
                let p: ParticipantParams = parse(params)?;
                let balance = c.htlc.balance(&p.participant).await.map_err(api_err)?;
                Ok(Reply::ok(
                    format!("{} balance {}", p.participant, balance),
                    json!({ "chain": p.participant.chain(), "balance": balance }),
                ))
            }

            "btc_utxos" => {
                let p: ParticipantParams = parse(params)?;
                let utxos = c.htlc.utxos(&p.participant).await.map_err(api_err)?;
                Ok(Reply::ok(
                    format!("{} unspent output(s)", utxos.len()),
                    to_payload(&utxos)?,
                ))
            }

            _ => Err(ApiError::invalid(format!("Unknown method: {}", method))),
        }
    }
}
