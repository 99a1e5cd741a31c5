//! In-memory interchange log.

use crate::domain::{BridgeError, BuyIntentId, InterchangeEvent};
use crate::ports::outbound::{AppendDecision, InterchangeLog};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Interchange log held in process memory.
#[derive(Default)]
pub struct InMemoryInterchangeLog {
    events: Mutex<BTreeMap<BuyIntentId, Vec<InterchangeEvent>>>,
}

impl InMemoryInterchangeLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl InterchangeLog for InMemoryInterchangeLog {
    fn read(&self, buy_intent_id: BuyIntentId) -> Result<Vec<InterchangeEvent>, BridgeError> {
        Ok(self
            .events
            .lock()
            .get(&buy_intent_id)
            .cloned()
            .unwrap_or_default())
    }

    fn append_with(
        &self,
        buy_intent_id: BuyIntentId,
        decide: &mut AppendDecision<'_>,
    ) -> Result<Vec<InterchangeEvent>, BridgeError> {
        let mut events = self.events.lock();
        let history = events.get(&buy_intent_id).map(Vec::as_slice).unwrap_or_default();
        let appended = decide(history)?;
        if appended.is_empty() {
            return Ok(events.get(&buy_intent_id).cloned().unwrap_or_default());
        }
        let history = events.entry(buy_intent_id).or_default();
        history.extend(appended);
        Ok(history.clone())
    }

    fn buy_intent_ids(&self) -> Result<Vec<BuyIntentId>, BridgeError> {
        Ok(self.events.lock().keys().copied().collect())
    }
}
