//! # Inbound Ports
//!
//! API exposed by the Secret Bridge.

use super::outbound::CounterpartEscrow;
use crate::domain::{
    BridgeError, BuyIntentId, HtlcRecord, InterchangeDocument, SecretPolicy, TradeIndex,
};
use async_trait::async_trait;
use shared_types::{Hash, HashLock};
use zeroize::Zeroizing;

/// Secret Bridge API - inbound port.
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Seed a batch, or load it when already seeded with the same policy.
    fn seed_batch(
        &self,
        buy_intent_id: BuyIntentId,
        policy: SecretPolicy,
    ) -> Result<InterchangeDocument, BridgeError>;

    /// Hash pair trade `trade_index` must commit to.
    fn hash_lock_for(
        &self,
        buy_intent_id: BuyIntentId,
        trade_index: TradeIndex,
    ) -> Result<HashLock, BridgeError>;

    /// Record the ETH lock of a trade. Idempotent per trade index.
    fn record_lock(
        &self,
        buy_intent_id: BuyIntentId,
        record: HtlcRecord,
    ) -> Result<InterchangeDocument, BridgeError>;

    /// Record the BTC lock of a trade. Idempotent for the same lock.
    fn record_counterpart_lock(
        &self,
        buy_intent_id: BuyIntentId,
        trade_index: TradeIndex,
        btc_lock_id: Hash,
    ) -> Result<InterchangeDocument, BridgeError>;

    /// Release the preimage of a trade once its counterpart is escrowed.
    async fn reveal_secret(
        &self,
        buy_intent_id: BuyIntentId,
        trade_index: TradeIndex,
        counterpart: &dyn CounterpartEscrow,
    ) -> Result<Zeroizing<Vec<u8>>, BridgeError>;

    /// Current document of a batch.
    fn document(&self, buy_intent_id: BuyIntentId) -> Result<InterchangeDocument, BridgeError>;

    /// Recompute every hash of a batch from its base secret.
    fn verify_document(&self, buy_intent_id: BuyIntentId) -> Result<(), BridgeError>;

    /// Seeded batches, ascending.
    fn list_batches(&self) -> Result<Vec<BuyIntentId>, BridgeError>;
}
