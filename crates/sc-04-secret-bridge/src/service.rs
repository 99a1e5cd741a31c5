//! # Secret Bridge Service
//!
//! Owns the base secret of every batch and the interchange log. All writes
//! go through [`InterchangeLog::append_with`], so re-seeding an existing
//! batch always returns its recorded secret.

use crate::algorithms::{generate_base_secret, hash_lock_for, preimage_for, verify_document};
use crate::domain::{
    invariant_policy_stable, invariant_record_commits, invariant_single_lock, BridgeError,
    BuyIntentId, HtlcRecord, InterchangeDocument, InterchangeEvent, SecretPolicy, TradeIndex,
};
use crate::ports::{BridgeApi, CounterpartEscrow, InterchangeLog};
use async_trait::async_trait;
use shared_types::{short_hex, Hash, HashLock, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// The Cross-Chain Secret Bridge.
pub struct SecretBridge {
    log: Arc<dyn InterchangeLog>,
    time_source: Arc<dyn TimeSource>,
}

impl SecretBridge {
    /// Create a bridge over an interchange log.
    pub fn new(log: Arc<dyn InterchangeLog>, time_source: Arc<dyn TimeSource>) -> Self {
        Self { log, time_source }
    }

    fn fold(
        buy_intent_id: BuyIntentId,
        events: &[InterchangeEvent],
    ) -> Result<InterchangeDocument, BridgeError> {
        InterchangeDocument::replay(events)?.ok_or(BridgeError::NotSeeded(buy_intent_id))
    }

    fn load(&self, buy_intent_id: BuyIntentId) -> Result<InterchangeDocument, BridgeError> {
        let events = self.log.read(buy_intent_id)?;
        Self::fold(buy_intent_id, &events)
    }
}

#[async_trait]
impl BridgeApi for SecretBridge {
    fn seed_batch(
        &self,
        buy_intent_id: BuyIntentId,
        policy: SecretPolicy,
    ) -> Result<InterchangeDocument, BridgeError> {
        let now = self.time_source.now();
        let mut reused = false;
        let events = self.log.append_with(buy_intent_id, &mut |history| {
            match InterchangeDocument::replay(history)? {
                Some(doc) => {
                    invariant_policy_stable(&doc, policy)?;
                    reused = true;
                    Ok(vec![])
                }
                None => Ok(vec![InterchangeEvent::Seeded {
                    buy_intent_id,
                    policy,
                    base_secret: generate_base_secret(),
                    at: now,
                }]),
            }
        })?;
        let doc = Self::fold(buy_intent_id, &events)?;

        if reused {
            debug!(
                "[sc-04] Batch {} already seeded, reusing base secret (keccak {})",
                buy_intent_id,
                short_hex(&doc.base_keccak)
            );
        } else {
            info!(
                "[sc-04] Seeded batch {} policy={} keccak={} sha256={}",
                buy_intent_id,
                policy,
                short_hex(&doc.base_keccak),
                short_hex(&doc.base_sha256)
            );
            if policy == SecretPolicy::SharedHash {
                warn!(
                    "[sc-04] Batch {} uses a shared hash: one reveal opens every lock in it",
                    buy_intent_id
                );
            }
        }
        Ok(doc)
    }

    fn hash_lock_for(
        &self,
        buy_intent_id: BuyIntentId,
        trade_index: TradeIndex,
    ) -> Result<HashLock, BridgeError> {
        let doc = self.load(buy_intent_id)?;
        Ok(hash_lock_for(&doc.base_secret, doc.policy, trade_index))
    }

    fn record_lock(
        &self,
        buy_intent_id: BuyIntentId,
        record: HtlcRecord,
    ) -> Result<InterchangeDocument, BridgeError> {
        let trade_index = record.trade_index;
        let lock_id = record.lock_id;
        let mut duplicate = false;
        let events = self.log.append_with(buy_intent_id, &mut |history| {
            let doc = Self::fold(buy_intent_id, history)?;
            if invariant_single_lock(&doc, &record)? {
                duplicate = true;
                return Ok(vec![]);
            }
            let expected = hash_lock_for(&doc.base_secret, doc.policy, trade_index);
            invariant_record_commits(&doc, &record, &expected)?;
            Ok(vec![InterchangeEvent::LockRecorded {
                buy_intent_id,
                record: record.clone(),
            }])
        })?;

        if duplicate {
            debug!(
                "[sc-04] Batch {} trade {} lock {} already recorded",
                buy_intent_id,
                trade_index,
                short_hex(&lock_id)
            );
        } else {
            info!(
                "[sc-04] Recorded lock {} for batch {} trade {}",
                short_hex(&lock_id),
                buy_intent_id,
                trade_index
            );
        }
        Self::fold(buy_intent_id, &events)
    }

    fn record_counterpart_lock(
        &self,
        buy_intent_id: BuyIntentId,
        trade_index: TradeIndex,
        btc_lock_id: Hash,
    ) -> Result<InterchangeDocument, BridgeError> {
        let events = self.log.append_with(buy_intent_id, &mut |history| {
            let doc = Self::fold(buy_intent_id, history)?;
            let record = doc.record(trade_index).ok_or(BridgeError::TradeNotRecorded {
                buy_intent_id,
                trade_index,
            })?;
            match record.btc_lock_id {
                Some(existing) if existing == btc_lock_id => Ok(vec![]),
                Some(_) => Err(BridgeError::LockRecordConflict {
                    buy_intent_id,
                    trade_index,
                }),
                None => Ok(vec![InterchangeEvent::CounterpartLockRecorded {
                    buy_intent_id,
                    trade_index,
                    btc_lock_id,
                }]),
            }
        })?;

        info!(
            "[sc-04] Batch {} trade {} counterpart lock {}",
            buy_intent_id,
            trade_index,
            short_hex(&btc_lock_id)
        );
        Self::fold(buy_intent_id, &events)
    }

    async fn reveal_secret(
        &self,
        buy_intent_id: BuyIntentId,
        trade_index: TradeIndex,
        counterpart: &dyn CounterpartEscrow,
    ) -> Result<Zeroizing<Vec<u8>>, BridgeError> {
        let doc = self.load(buy_intent_id)?;
        let record = doc
            .record(trade_index)
            .ok_or(BridgeError::TradeNotRecorded {
                buy_intent_id,
                trade_index,
            })?
            .clone();

        if !counterpart.is_escrowed(&record).await? {
            warn!(
                "[sc-04] Refusing reveal for batch {} trade {}: counterpart not escrowed",
                buy_intent_id, trade_index
            );
            return Err(BridgeError::CounterpartNotEscrowed {
                buy_intent_id,
                trade_index,
            });
        }

        let now = self.time_source.now();
        self.log.append_with(buy_intent_id, &mut |history| {
            let doc = Self::fold(buy_intent_id, history)?;
            if doc.revealed.contains(&trade_index) {
                return Ok(vec![]);
            }
            Ok(vec![InterchangeEvent::SecretRevealed {
                buy_intent_id,
                trade_index,
                at: now,
            }])
        })?;

        info!(
            "[sc-04] Revealed preimage for batch {} trade {} (lock {})",
            buy_intent_id,
            trade_index,
            short_hex(&record.lock_id)
        );
        Ok(preimage_for(&doc.base_secret, doc.policy, trade_index))
    }

    fn document(&self, buy_intent_id: BuyIntentId) -> Result<InterchangeDocument, BridgeError> {
        self.load(buy_intent_id)
    }

    fn verify_document(&self, buy_intent_id: BuyIntentId) -> Result<(), BridgeError> {
        let doc = self.load(buy_intent_id)?;
        verify_document(&doc)
    }

    fn list_batches(&self) -> Result<Vec<BuyIntentId>, BridgeError> {
        self.log.buy_intent_ids()
    }
}
