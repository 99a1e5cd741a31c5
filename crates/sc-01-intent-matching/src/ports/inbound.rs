//! # Inbound Ports
//!
//! API trait defining what the Intent Ledger can do.

use crate::domain::{
    BuyIntent, BuyIntentSpec, IntentError, IntentId, IntentSnapshot, IntentStatus, MatchedTrade,
    SellIntent, SellIntentSpec, Side, TradeId,
};
use async_trait::async_trait;
use shared_types::{Address, Hash};

/// Intent ledger API - inbound port.
#[async_trait]
pub trait IntentApi: Send + Sync {
    /// Record a buy intent.
    async fn submit_buy_intent(&self, spec: BuyIntentSpec) -> Result<IntentId, IntentError>;

    /// Record a sell intent.
    ///
    /// Once a market maker is set, only it may sell.
    async fn submit_sell_intent(&self, spec: SellIntentSpec) -> Result<IntentId, IntentError>;

    /// Restrict sell intents to `maker`. Replaces any earlier maker.
    fn set_market_maker(&self, maker: Address) -> Result<(), IntentError>;

    /// Current market maker, if sells are restricted.
    fn market_maker(&self) -> Option<Address>;

    /// Match a buy intent against the open sell book.
    ///
    /// Returns only the trades created by this call.
    async fn match_intent(
        &self,
        buy_intent_id: IntentId,
        executor: Address,
    ) -> Result<Vec<MatchedTrade>, IntentError>;

    /// Cancel an open intent.
    async fn cancel_intent(&self, side: Side, id: IntentId) -> Result<IntentStatus, IntentError>;

    /// Link a trade to the ETH lock opened for it.
    async fn associate_lock(&self, trade_id: TradeId, lock_id: Hash) -> Result<(), IntentError>;

    /// Get buy intent by ID.
    fn get_buy_intent(&self, id: IntentId) -> Option<BuyIntent>;

    /// Get sell intent by ID.
    fn get_sell_intent(&self, id: IntentId) -> Option<SellIntent>;

    /// Copy of the whole book.
    fn list_intents(&self) -> IntentSnapshot;

    /// Get trade by ID.
    fn get_trade(&self, trade_id: TradeId) -> Option<MatchedTrade>;

    /// Trades of one buy intent, in batch order.
    fn trades_for(&self, buy_intent_id: IntentId) -> Vec<MatchedTrade>;

    /// Lock linked to a trade.
    fn lock_for(&self, trade_id: TradeId) -> Option<Hash>;
}
