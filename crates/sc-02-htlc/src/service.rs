//! # HTLC Coordinator Service
//!
//! Sole writer of lock state. A lock is recorded only after its chain adapter
//! confirms the escrow, and moves to a terminal state only after the adapter
//! confirms the payout. Terminal transitions on one lock serialize on a
//! per-lock async mutex held across the chain call.

use crate::algorithms::derive_lock_id;
use crate::domain::{
    invariant_pairing, invariant_preimage_matches, invariant_settleable, invariant_valid_params,
    HtlcError, Lock, LockId, LockParams, LockState, Participant, Settlement, Utxo,
};
use crate::ports::{ChainEscrow, HtlcApi};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{short_hex, ChainId, TimeSource, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinator settings.
#[derive(Clone, Debug, Default)]
pub struct HtlcConfig {
    /// Minimum gap between the timelocks of paired legs, in seconds.
    pub min_timelock_margin_secs: u64,
}

#[derive(Default)]
struct LockBook {
    locks: HashMap<LockId, Lock>,
    order: Vec<LockId>,
}

/// The HTLC Coordinator.
pub struct HtlcCoordinator {
    config: HtlcConfig,
    eth: Arc<dyn ChainEscrow>,
    btc: Arc<dyn ChainEscrow>,
    book: RwLock<LockBook>,
    settle_guards: Mutex<HashMap<LockId, Arc<tokio::sync::Mutex<()>>>>,
    nonce: AtomicU64,
    time_source: Arc<dyn TimeSource>,
}

impl HtlcCoordinator {
    /// Create a coordinator over one escrow adapter per chain.
    pub fn new(
        config: HtlcConfig,
        eth: Arc<dyn ChainEscrow>,
        btc: Arc<dyn ChainEscrow>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            eth,
            btc,
            book: RwLock::new(LockBook::default()),
            settle_guards: Mutex::new(HashMap::new()),
            nonce: AtomicU64::new(0),
            time_source,
        }
    }

    fn escrow_for(&self, chain: ChainId) -> &Arc<dyn ChainEscrow> {
        match chain {
            ChainId::Eth => &self.eth,
            ChainId::Btc => &self.btc,
        }
    }

    /// Guard entries exist only while a lock is `Locked`. Checked under the
    /// book read lock so `commit_terminal` cannot race a fresh insert.
    fn settle_guard(&self, lock_id: LockId) -> Result<Arc<tokio::sync::Mutex<()>>, HtlcError> {
        let book = self.book.read();
        let lock = book
            .locks
            .get(&lock_id)
            .ok_or(HtlcError::LockNotFound(lock_id))?;
        if lock.state.is_terminal() {
            return Err(HtlcError::AlreadyTerminal {
                lock_id,
                state: lock.state,
            });
        }
        let guard = self
            .settle_guards
            .lock()
            .entry(lock_id)
            .or_default()
            .clone();
        Ok(guard)
    }

    fn commit_terminal(&self, lock_id: LockId, state: LockState) -> Result<Lock, HtlcError> {
        let now = self.time_source.now();
        let mut book = self.book.write();
        let lock = book
            .locks
            .get_mut(&lock_id)
            .ok_or(HtlcError::LockNotFound(lock_id))?;
        invariant_settleable(lock, state)?;
        lock.state = state;
        lock.settled_at = Some(now);
        let settled = lock.clone();
        self.settle_guards.lock().remove(&lock_id);
        Ok(settled)
    }

    /// Settlement of an already-validated lock, shared by withdraw and refund.
    async fn settle(
        &self,
        lock_id: LockId,
        next: LockState,
        preimage: Option<&[u8]>,
    ) -> Result<Settlement, HtlcError> {
        let guard = self.settle_guard(lock_id)?;
        let _held = guard.lock().await;

        let lock = self
            .get_lock(lock_id)
            .ok_or(HtlcError::LockNotFound(lock_id))?;
        invariant_settleable(&lock, next)?;

        let escrow = self.escrow_for(lock.chain);
        let paid_to = match (next, preimage) {
            (LockState::Withdrawn, Some(preimage)) => {
                invariant_preimage_matches(&lock, preimage)?;
                escrow.release(&lock, preimage).await.map_err(|e| {
                    warn!("[sc-02] Release of {} failed: {}", short_hex(&lock_id), e);
                    e
                })?;
                lock.recipient.clone()
            }
            _ => {
                let now = self.time_source.now();
                if now < lock.timelock {
                    return Err(HtlcError::NotExpired {
                        lock_id,
                        timelock: lock.timelock,
                        now,
                    });
                }
                escrow.reclaim(&lock).await.map_err(|e| {
                    warn!("[sc-02] Reclaim of {} failed: {}", short_hex(&lock_id), e);
                    e
                })?;
                lock.sender.clone()
            }
        };

        let settled = self.commit_terminal(lock_id, next)?;
        info!(
            "[sc-02] {} lock {} {}: {} to {}",
            settled.chain,
            short_hex(&lock_id),
            settled.state,
            settled.amount,
            paid_to
        );

        Ok(Settlement {
            lock_id,
            chain: settled.chain,
            state: settled.state,
            amount: settled.amount,
            paid_to,
            preimage: preimage.map(<[u8]>::to_vec),
        })
    }
}

#[async_trait]
impl HtlcApi for HtlcCoordinator {
    async fn create_lock(&self, params: LockParams) -> Result<Lock, HtlcError> {
        let now = self.time_source.now();
        invariant_valid_params(&params, now)?;

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let lock_id = derive_lock_id(&params, nonce);
        let escrow = self
            .escrow_for(params.chain)
            .escrow(lock_id, &params)
            .await?;

        let lock = Lock {
            lock_id,
            chain: params.chain,
            sender: params.sender,
            recipient: params.recipient,
            hash_lock: params.hash_lock,
            timelock: params.timelock,
            amount: params.amount,
            state: LockState::Locked,
            escrow,
            created_at: now,
            settled_at: None,
        };

        {
            let mut book = self.book.write();
            book.order.push(lock_id);
            book.locks.insert(lock_id, lock.clone());
        }

        info!(
            "[sc-02] {} lock {} created: {} until {}",
            lock.chain,
            short_hex(&lock_id),
            lock.amount,
            lock.timelock
        );
        Ok(lock)
    }

    async fn create_lock_pair(
        &self,
        first_claimed: LockParams,
        second_claimed: LockParams,
    ) -> Result<(Lock, Lock), HtlcError> {
        invariant_pairing(
            &first_claimed,
            &second_claimed,
            self.config.min_timelock_margin_secs,
        )?;
        let now = self.time_source.now();
        invariant_valid_params(&first_claimed, now)?;
        invariant_valid_params(&second_claimed, now)?;

        let first = self.create_lock(first_claimed).await?;
        let second = self.create_lock(second_claimed).await.map_err(|e| {
            warn!(
                "[sc-02] Second leg failed, {} stays Locked until refund: {}",
                short_hex(&first.lock_id),
                e
            );
            e
        })?;
        Ok((first, second))
    }

    async fn withdraw(&self, lock_id: LockId, preimage: &[u8]) -> Result<Settlement, HtlcError> {
        self.settle(lock_id, LockState::Withdrawn, Some(preimage))
            .await
    }

    async fn refund(&self, lock_id: LockId) -> Result<Settlement, HtlcError> {
        self.settle(lock_id, LockState::Refunded, None).await
    }

    fn check_pair_ordering(
        &self,
        first_claimed: LockId,
        second_claimed: &LockParams,
    ) -> Result<(), HtlcError> {
        let first = self
            .get_lock(first_claimed)
            .ok_or(HtlcError::LockNotFound(first_claimed))?;
        invariant_pairing(
            &first.params(),
            second_claimed,
            self.config.min_timelock_margin_secs,
        )
    }

    fn get_lock(&self, lock_id: LockId) -> Option<Lock> {
        self.book.read().locks.get(&lock_id).cloned()
    }

    fn list_locks(&self, chain: Option<ChainId>) -> Vec<Lock> {
        let book = self.book.read();
        book.order
            .iter()
            .filter_map(|id| book.locks.get(id))
            .filter(|lock| chain.map_or(true, |c| lock.chain == c))
            .cloned()
            .collect()
    }

    async fn revealed_preimage(&self, lock_id: LockId) -> Result<Option<Vec<u8>>, HtlcError> {
        let lock = self
            .get_lock(lock_id)
            .ok_or(HtlcError::LockNotFound(lock_id))?;
        debug!("[sc-02] Reading revealed preimage of {}", short_hex(&lock_id));
        self.escrow_for(lock.chain).revealed_preimage(lock_id).await
    }

    async fn balance(&self, who: &Participant) -> Result<U256, HtlcError> {
        who.validate()?;
        self.escrow_for(who.chain()).balance(who).await
    }

    async fn utxos(&self, who: &Participant) -> Result<Vec<Utxo>, HtlcError> {
        who.validate()?;
        self.escrow_for(who.chain()).utxos(who).await
    }
}
