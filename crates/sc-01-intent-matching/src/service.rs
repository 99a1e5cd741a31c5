//! # Intent Ledger Service
//!
//! Implements [`IntentApi`] over an in-memory book guarded by one
//! `parking_lot::RwLock`. A match is planned and applied on working copies
//! under the write lock, checked against the invariants, then committed as a
//! whole.

use crate::algorithms::plan_matches;
use crate::domain::{
    invariant_buy_within_bounds, invariant_conservation, invariant_sell_within_bounds,
    invariant_status_transition, offchain_id, BuyIntent, BuyIntentSpec, IntentError, IntentId,
    IntentSnapshot, IntentStatus, MatchedTrade, SellIntent, SellIntentSpec, Side, TradeId,
    MAX_SLIPPAGE_BPS,
};
use crate::ports::IntentApi;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{short_hex, Address, Hash, TimeSource, U256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct LedgerState {
    buys: BTreeMap<IntentId, BuyIntent>,
    sells: BTreeMap<IntentId, SellIntent>,
    trades: Vec<MatchedTrade>,
    trades_by_buy: HashMap<IntentId, Vec<usize>>,
    lock_links: HashMap<TradeId, Hash>,
    next_buy_id: IntentId,
    next_sell_id: IntentId,
    market_maker: Option<Address>,
}

/// The intent ledger and matching engine.
pub struct IntentLedger {
    state: RwLock<LedgerState>,
    time_source: Arc<dyn TimeSource>,
}

impl IntentLedger {
    /// Create an empty ledger.
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            time_source,
        }
    }

    /// Start buy intent ids at `first`.
    ///
    /// Used after a restart so new batches do not reuse ids already present
    /// in a persisted interchange log.
    pub fn with_first_buy_id(self, first: IntentId) -> Self {
        self.state.write().next_buy_id = first;
        self
    }

    fn validate_buy(&self, spec: &BuyIntentSpec) -> Result<(), IntentError> {
        if spec.buyer == [0u8; 20] {
            return Err(IntentError::ZeroAddress(Side::Buy));
        }
        if spec.sell_amount_btc == 0 {
            return Err(IntentError::InvalidAmount {
                field: "sellAmountBtc",
            });
        }
        if spec.min_buy_amount_eth.is_zero() {
            return Err(IntentError::InvalidAmount {
                field: "minBuyAmountEth",
            });
        }
        if spec.slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(IntentError::InvalidSlippage(spec.slippage_bps));
        }
        let now = self.time_source.now();
        if spec.locktime <= now {
            return Err(IntentError::DeadlineInPast {
                deadline: spec.locktime,
                now,
            });
        }
        Ok(())
    }

    fn validate_sell(&self, spec: &SellIntentSpec) -> Result<(), IntentError> {
        if spec.seller == [0u8; 20] {
            return Err(IntentError::ZeroAddress(Side::Sell));
        }
        if spec.sell_amount_eth.is_zero() {
            return Err(IntentError::InvalidAmount {
                field: "sellAmountEth",
            });
        }
        if spec.min_buy_amount_btc == 0 {
            return Err(IntentError::InvalidAmount {
                field: "minBuyAmountBtc",
            });
        }
        let now = self.time_source.now();
        if spec.deadline <= now {
            return Err(IntentError::DeadlineInPast {
                deadline: spec.deadline,
                now,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IntentApi for IntentLedger {
    async fn submit_buy_intent(&self, spec: BuyIntentSpec) -> Result<IntentId, IntentError> {
        self.validate_buy(&spec)?;
        let now = self.time_source.now();

        let mut state = self.state.write();
        let id = state.next_buy_id;
        state.next_buy_id += 1;
        state.buys.insert(
            id,
            BuyIntent {
                id,
                buyer: spec.buyer,
                sell_amount_btc: spec.sell_amount_btc,
                min_buy_amount_eth: spec.min_buy_amount_eth,
                locktime: spec.locktime,
                offchain_id: offchain_id(&spec.offchain_label),
                slippage_bps: spec.slippage_bps,
                status: IntentStatus::Pending,
                filled_btc: 0,
                received_eth: U256::zero(),
                created_at: now,
            },
        );

        info!(
            "[sc-01] BuyIntent {} recorded: {} sat for >= {} wei",
            id, spec.sell_amount_btc, spec.min_buy_amount_eth
        );
        Ok(id)
    }

    async fn submit_sell_intent(&self, spec: SellIntentSpec) -> Result<IntentId, IntentError> {
        self.validate_sell(&spec)?;
        let now = self.time_source.now();

        let mut state = self.state.write();
        if let Some(maker) = state.market_maker {
            if spec.seller != maker {
                warn!(
                    "[sc-01] SellIntent from 0x{} rejected: market maker is 0x{}",
                    short_hex(&spec.seller),
                    short_hex(&maker)
                );
                return Err(IntentError::NotMarketMaker(spec.seller));
            }
        }
        let id = state.next_sell_id;
        state.next_sell_id += 1;
        state.sells.insert(
            id,
            SellIntent {
                id,
                seller: spec.seller,
                sell_amount_eth: spec.sell_amount_eth,
                min_buy_amount_btc: spec.min_buy_amount_btc,
                deadline: spec.deadline,
                offchain_id: offchain_id(&spec.offchain_label),
                status: IntentStatus::Pending,
                filled_eth: U256::zero(),
                received_btc: 0,
                created_at: now,
            },
        );

        info!(
            "[sc-01] SellIntent {} recorded: {} wei for >= {} sat",
            id, spec.sell_amount_eth, spec.min_buy_amount_btc
        );
        Ok(id)
    }

    fn set_market_maker(&self, maker: Address) -> Result<(), IntentError> {
        if maker == [0u8; 20] {
            return Err(IntentError::ZeroAddress(Side::Sell));
        }
        self.state.write().market_maker = Some(maker);
        info!("[sc-01] Market maker set to 0x{}", short_hex(&maker));
        Ok(())
    }

    fn market_maker(&self) -> Option<Address> {
        self.state.read().market_maker
    }

    async fn match_intent(
        &self,
        buy_intent_id: IntentId,
        executor: Address,
    ) -> Result<Vec<MatchedTrade>, IntentError> {
        let now = self.time_source.now();
        let mut state = self.state.write();

        let mut buy = state
            .buys
            .get(&buy_intent_id)
            .cloned()
            .ok_or(IntentError::IntentNotFound {
                side: Side::Buy,
                id: buy_intent_id,
            })?;

        if buy.status.is_terminal() {
            debug!(
                "[sc-01] BuyIntent {} is {}, nothing to match",
                buy_intent_id, buy.status
            );
            return Ok(Vec::new());
        }
        if buy.locktime <= now {
            return Err(IntentError::BuyIntentExpired {
                id: buy_intent_id,
                locktime: buy.locktime,
                now,
            });
        }

        let plan = plan_matches(&buy, state.sells.values(), now);
        for (sell_id, reason) in &plan.skipped {
            warn!(
                "[sc-01] SellIntent {} skipped for BuyIntent {}: {:?}",
                sell_id, buy_intent_id, reason
            );
        }
        if plan.allocations.is_empty() {
            return Ok(Vec::new());
        }

        // Apply to working copies; nothing is written until every check passes.
        let mut touched_sells: Vec<SellIntent> = Vec::with_capacity(plan.allocations.len());
        let mut new_trades = Vec::with_capacity(plan.allocations.len());
        let prior_trades = state.trades_by_buy.get(&buy_intent_id).map_or(0, Vec::len);
        let mut next_trade_id = state.trades.len() as TradeId;

        for (offset, allocation) in plan.allocations.iter().enumerate() {
            let mut sell = state
                .sells
                .get(&allocation.sell_intent_id)
                .cloned()
                .ok_or(IntentError::IntentNotFound {
                    side: Side::Sell,
                    id: allocation.sell_intent_id,
                })?;

            sell.filled_eth = sell.filled_eth.saturating_add(allocation.eth_amount);
            sell.received_btc = sell.received_btc.saturating_add(allocation.btc_amount);
            let next = sell.derived_status();
            invariant_status_transition(sell.status, next)?;
            sell.status = next;
            invariant_sell_within_bounds(&sell)?;

            buy.received_eth = buy.received_eth.saturating_add(allocation.eth_amount);
            buy.filled_btc = buy.filled_btc.saturating_add(allocation.btc_amount);

            new_trades.push(MatchedTrade {
                trade_id: next_trade_id,
                batch_index: (prior_trades + offset) as u64,
                buy_intent_id,
                sell_intent_id: sell.id,
                executor,
                recipient: buy.buyer,
                seller: sell.seller,
                eth_amount: allocation.eth_amount,
                btc_amount: allocation.btc_amount,
                locktime: buy.locktime,
                timestamp: now,
            });
            next_trade_id += 1;
            touched_sells.push(sell);
        }

        let next = buy.derived_status();
        invariant_status_transition(buy.status, next)?;
        buy.status = next;
        invariant_buy_within_bounds(&buy)?;

        let mut all_trades: Vec<MatchedTrade> = state
            .trades_by_buy
            .get(&buy_intent_id)
            .map(|idx| idx.iter().map(|&i| state.trades[i].clone()).collect())
            .unwrap_or_default();
        all_trades.extend(new_trades.iter().cloned());
        if !invariant_conservation(&buy, &all_trades) {
            return Err(IntentError::Overfill {
                side: Side::Buy,
                id: buy_intent_id,
            });
        }

        // Commit
        for sell in touched_sells {
            state.sells.insert(sell.id, sell);
        }
        for trade in &new_trades {
            let index = state.trades.len();
            state.trades.push(trade.clone());
            state
                .trades_by_buy
                .entry(buy_intent_id)
                .or_default()
                .push(index);
        }
        let status = buy.status;
        state.buys.insert(buy_intent_id, buy);

        info!(
            "[sc-01] BuyIntent {} matched: {} trade(s), status {}",
            buy_intent_id,
            new_trades.len(),
            status
        );
        Ok(new_trades)
    }

    async fn cancel_intent(&self, side: Side, id: IntentId) -> Result<IntentStatus, IntentError> {
        let mut state = self.state.write();
        let status = match side {
            Side::Buy => {
                let buy = state
                    .buys
                    .get_mut(&id)
                    .ok_or(IntentError::IntentNotFound { side, id })?;
                invariant_status_transition(buy.status, IntentStatus::Cancelled)?;
                buy.status = IntentStatus::Cancelled;
                buy.status
            }
            Side::Sell => {
                let sell = state
                    .sells
                    .get_mut(&id)
                    .ok_or(IntentError::IntentNotFound { side, id })?;
                invariant_status_transition(sell.status, IntentStatus::Cancelled)?;
                sell.status = IntentStatus::Cancelled;
                sell.status
            }
        };

        info!("[sc-01] {:?} intent {} cancelled", side, id);
        Ok(status)
    }

    async fn associate_lock(&self, trade_id: TradeId, lock_id: Hash) -> Result<(), IntentError> {
        let mut state = self.state.write();
        if trade_id as usize >= state.trades.len() {
            return Err(IntentError::TradeNotFound(trade_id));
        }

        match state.lock_links.get(&trade_id) {
            Some(existing) if *existing == lock_id => {
                debug!("[sc-01] Trade {} already linked to this lock", trade_id);
                Ok(())
            }
            Some(existing) => Err(IntentError::LockAlreadyAssociated {
                trade_id,
                existing: *existing,
            }),
            None => {
                state.lock_links.insert(trade_id, lock_id);
                info!(
                    "[sc-01] Trade {} associated with lock {}",
                    trade_id,
                    short_hex(&lock_id)
                );
                Ok(())
            }
        }
    }

    fn get_buy_intent(&self, id: IntentId) -> Option<BuyIntent> {
        self.state.read().buys.get(&id).cloned()
    }

    fn get_sell_intent(&self, id: IntentId) -> Option<SellIntent> {
        self.state.read().sells.get(&id).cloned()
    }

    fn list_intents(&self) -> IntentSnapshot {
        let state = self.state.read();
        IntentSnapshot {
            buy_intents: state.buys.values().cloned().collect(),
            sell_intents: state.sells.values().cloned().collect(),
        }
    }

    fn get_trade(&self, trade_id: TradeId) -> Option<MatchedTrade> {
        self.state.read().trades.get(trade_id as usize).cloned()
    }

    fn trades_for(&self, buy_intent_id: IntentId) -> Vec<MatchedTrade> {
        let state = self.state.read();
        state
            .trades_by_buy
            .get(&buy_intent_id)
            .map(|idx| idx.iter().map(|&i| state.trades[i].clone()).collect())
            .unwrap_or_default()
    }

    fn lock_for(&self, trade_id: TradeId) -> Option<Hash> {
        self.state.read().lock_links.get(&trade_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{eth_to_wei, ManualTimeSource, SATS_PER_BTC};

    const NOW: u64 = 1_700_000_000;
    const EXECUTOR: Address = [0xEEu8; 20];

    fn ledger() -> (IntentLedger, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        (IntentLedger::new(clock.clone()), clock)
    }

    fn buy_spec(btc: u64, eth: u64) -> BuyIntentSpec {
        BuyIntentSpec {
            buyer: [1u8; 20],
            sell_amount_btc: btc,
            min_buy_amount_eth: eth_to_wei(eth),
            locktime: NOW + 3_600,
            offchain_label: "buy-eth".to_string(),
            slippage_bps: 0,
        }
    }

    fn sell_spec(eth: u64, min_btc: u64) -> SellIntentSpec {
        SellIntentSpec {
            seller: [2u8; 20],
            sell_amount_eth: eth_to_wei(eth),
            min_buy_amount_btc: min_btc,
            deadline: NOW + 3_600,
            offchain_label: "sell-eth".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sell_restricted_to_market_maker() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.market_maker(), None);
        ledger.set_market_maker([9u8; 20]).unwrap();
        assert_eq!(ledger.market_maker(), Some([9u8; 20]));

        let err = ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap_err();
        assert_eq!(err, IntentError::NotMarketMaker([2u8; 20]));
        assert!(ledger.list_intents().sell_intents.is_empty());

        let mut spec = sell_spec(20, 9 * SATS_PER_BTC);
        spec.seller = [9u8; 20];
        assert_eq!(ledger.submit_sell_intent(spec).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_market_maker_rejected() {
        let (ledger, _) = ledger();
        assert_eq!(
            ledger.set_market_maker([0u8; 20]),
            Err(IntentError::ZeroAddress(Side::Sell))
        );
        assert_eq!(ledger.market_maker(), None);
    }

    #[tokio::test]
    async fn test_first_buy_id_offset() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let ledger = IntentLedger::new(clock).with_first_buy_id(5);
        let id = ledger
            .submit_buy_intent(buy_spec(SATS_PER_BTC, 5))
            .await
            .unwrap();
        assert_eq!(id, 5);
        let sell = ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap();
        assert_eq!(sell, 0);
    }

    #[tokio::test]
    async fn test_match_one_to_one() {
        let (ledger, _) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        let sell = ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap();

        let trades = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].eth_amount, eth_to_wei(10));
        assert_eq!(trades[0].btc_amount, 2 * SATS_PER_BTC);
        assert_eq!(trades[0].recipient, [1u8; 20]);
        assert_eq!(trades[0].executor, EXECUTOR);

        let b = ledger.get_buy_intent(buy).unwrap();
        assert_eq!(b.status, IntentStatus::Filled);
        let s = ledger.get_sell_intent(sell).unwrap();
        assert_eq!(s.status, IntentStatus::Partial);
        assert_eq!(s.remaining_eth(), eth_to_wei(10));
    }

    #[tokio::test]
    async fn test_rematch_filled_is_noop() {
        let (ledger, _) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap();

        ledger.match_intent(buy, EXECUTOR).await.unwrap();
        let again = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(ledger.trades_for(buy).len(), 1);
    }

    #[tokio::test]
    async fn test_partial_then_complete() {
        let (ledger, _) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        ledger
            .submit_sell_intent(sell_spec(4, 80_000_000))
            .await
            .unwrap();

        let first = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(
            ledger.get_buy_intent(buy).unwrap().status,
            IntentStatus::Partial
        );

        ledger
            .submit_sell_intent(sell_spec(6, 120_000_000))
            .await
            .unwrap();
        let second = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].batch_index, 1);
        assert_eq!(second[0].trade_id, 1);

        let b = ledger.get_buy_intent(buy).unwrap();
        assert_eq!(b.status, IntentStatus::Filled);
        assert_eq!(b.filled_btc, 2 * SATS_PER_BTC);
    }

    #[tokio::test]
    async fn test_cancelled_buy_yields_nothing() {
        let (ledger, _) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap();

        ledger.cancel_intent(Side::Buy, buy).await.unwrap();
        assert!(ledger.match_intent(buy, EXECUTOR).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_filled_is_conflict() {
        let (ledger, _) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap();
        ledger.match_intent(buy, EXECUTOR).await.unwrap();

        let result = ledger.cancel_intent(Side::Buy, buy).await;
        assert!(matches!(
            result,
            Err(IntentError::InvalidTransition {
                from: IntentStatus::Filled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_expired_buy_rejected() {
        let (ledger, clock) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        clock.advance(3_600);

        let result = ledger.match_intent(buy, EXECUTOR).await;
        assert!(matches!(result, Err(IntentError::BuyIntentExpired { .. })));
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let (ledger, _) = ledger();
        let mut spec = buy_spec(0, 10);
        assert!(matches!(
            ledger.submit_buy_intent(spec.clone()).await,
            Err(IntentError::InvalidAmount { .. })
        ));

        spec.sell_amount_btc = 1;
        spec.slippage_bps = 10_001;
        assert!(matches!(
            ledger.submit_buy_intent(spec.clone()).await,
            Err(IntentError::InvalidSlippage(10_001))
        ));

        let mut sell = sell_spec(1, 1);
        sell.deadline = NOW;
        assert!(matches!(
            ledger.submit_sell_intent(sell).await,
            Err(IntentError::DeadlineInPast { .. })
        ));
    }

    #[tokio::test]
    async fn test_associate_lock_idempotent() {
        let (ledger, _) = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        ledger
            .submit_sell_intent(sell_spec(20, 9 * SATS_PER_BTC))
            .await
            .unwrap();
        let trades = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        let trade_id = trades[0].trade_id;

        ledger.associate_lock(trade_id, [7u8; 32]).await.unwrap();
        ledger.associate_lock(trade_id, [7u8; 32]).await.unwrap();
        assert!(matches!(
            ledger.associate_lock(trade_id, [8u8; 32]).await,
            Err(IntentError::LockAlreadyAssociated { .. })
        ));
        assert_eq!(ledger.lock_for(trade_id), Some([7u8; 32]));
        assert!(matches!(
            ledger.associate_lock(99, [7u8; 32]).await,
            Err(IntentError::TradeNotFound(99))
        ));
    }
}
