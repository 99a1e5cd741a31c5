//! The BTC leg as seen by the secret bridge.

use async_trait::async_trait;
use sc_02_htlc::{HtlcApi, LockState};
use sc_04_secret_bridge::{BridgeError, CounterpartEscrow, HtlcRecord};
use shared_types::{short_hex, ChainId, U256};
use std::sync::Arc;
use tracing::debug;

/// Reports a trade's BTC lock as escrowed when it is Locked with the trade's
/// sha256 hash and BTC amount.
pub struct BtcCounterpart {
    htlc: Arc<dyn HtlcApi>,
}

impl BtcCounterpart {
    /// Observe locks held by `htlc`.
    pub fn new(htlc: Arc<dyn HtlcApi>) -> Self {
        Self { htlc }
    }
}

#[async_trait]
impl CounterpartEscrow for BtcCounterpart {
    async fn is_escrowed(&self, record: &HtlcRecord) -> Result<bool, BridgeError> {
        let Some(btc_lock_id) = record.btc_lock_id else {
            return Ok(false);
        };
        let Some(lock) = self.htlc.get_lock(btc_lock_id) else {
            return Ok(false);
        };

        let escrowed = lock.chain == ChainId::Btc
            && lock.state == LockState::Locked
            && lock.hash_lock.sha256 == record.secret_hash_sha256
            && lock.amount == U256::from(record.btc_amount);
        debug!(
            "[runtime] BTC lock {} for trade {} escrowed={}",
            short_hex(&btc_lock_id),
            record.trade_index,
            escrowed
        );
        Ok(escrowed)
    }
}
