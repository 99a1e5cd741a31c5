//! # Outbound Ports
//!
//! The interchange store and the view of the counterpart chain.

use crate::domain::{BridgeError, BuyIntentId, HtlcRecord, InterchangeEvent};
use async_trait::async_trait;

/// Decides what to append given the events already on record.
pub type AppendDecision<'a> =
    dyn FnMut(&[InterchangeEvent]) -> Result<Vec<InterchangeEvent>, BridgeError> + 'a;

/// Append-only event log keyed by buy intent - outbound port.
///
/// `append_with` is the only write path. Implementations hold the store
/// exclusively from the read through the append, so two writers can never
/// both decide against the same history.
pub trait InterchangeLog: Send + Sync {
    /// Events recorded for one buy intent, in append order.
    fn read(&self, buy_intent_id: BuyIntentId) -> Result<Vec<InterchangeEvent>, BridgeError>;

    /// Atomically read, decide and append. Returns the history after the append.
    fn append_with(
        &self,
        buy_intent_id: BuyIntentId,
        decide: &mut AppendDecision<'_>,
    ) -> Result<Vec<InterchangeEvent>, BridgeError>;

    /// Buy intents with at least one event, ascending.
    fn buy_intent_ids(&self) -> Result<Vec<BuyIntentId>, BridgeError>;
}

/// Whether the other leg of a trade is funded - outbound port.
#[async_trait]
pub trait CounterpartEscrow: Send + Sync {
    /// True once the counterpart lock for `record` is observably escrowed.
    async fn is_escrowed(&self, record: &HtlcRecord) -> Result<bool, BridgeError>;
}
