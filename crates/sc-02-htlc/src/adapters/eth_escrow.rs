//! In-memory ETH escrow.
//!
//! Account balances plus a per-lock escrow table, standing in for the HTLC
//! contract on the ETH leg.

use crate::domain::{EscrowReceipt, HtlcError, Lock, LockId, LockParams, Participant};
use crate::ports::ChainEscrow;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{keccak256, short_hex, Address, ChainId, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// ETH escrow adapter backed by memory.
pub struct InMemoryEthEscrow {
    contract: Address,
    balances: RwLock<HashMap<Address, U256>>,
    escrowed: RwLock<HashMap<LockId, U256>>,
    revealed: RwLock<HashMap<LockId, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl InMemoryEthEscrow {
    /// Create an adapter whose escrows live at `contract`.
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            balances: RwLock::new(HashMap::new()),
            escrowed: RwLock::new(HashMap::new()),
            revealed: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Credit an account.
    pub fn fund(&self, account: Address, amount: U256) -> U256 {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_insert_with(U256::zero);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Total currently held in escrow.
    pub fn total_escrowed(&self) -> U256 {
        self.escrowed
            .read()
            .values()
            .fold(U256::zero(), |acc, v| acc.saturating_add(*v))
    }

    /// Make every chain call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), HtlcError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HtlcError::ChainUnavailable {
                chain: ChainId::Eth,
                reason: "rpc endpoint unreachable".into(),
            });
        }
        Ok(())
    }

    fn account(who: &Participant) -> Result<Address, HtlcError> {
        match who {
            Participant::Eth(addr) => Ok(*addr),
            other => Err(HtlcError::ChainMismatch {
                expected: ChainId::Eth,
                got: other.chain(),
            }),
        }
    }

    fn pay_out(&self, lock: &Lock, to: &Participant) -> Result<(), HtlcError> {
        let account = Self::account(to)?;
        let amount = self
            .escrowed
            .write()
            .remove(&lock.lock_id)
            .ok_or_else(|| HtlcError::ChainUnavailable {
                chain: ChainId::Eth,
                reason: format!("no escrow held for {}", short_hex(&lock.lock_id)),
            })?;
        self.fund(account, amount);
        Ok(())
    }
}

#[async_trait]
impl ChainEscrow for InMemoryEthEscrow {
    fn chain(&self) -> ChainId {
        ChainId::Eth
    }

    async fn escrow(
        &self,
        lock_id: LockId,
        params: &LockParams,
    ) -> Result<EscrowReceipt, HtlcError> {
        self.ensure_available()?;
        let sender = Self::account(&params.sender)?;

        {
            let mut balances = self.balances.write();
            let available = balances.get(&sender).copied().unwrap_or_default();
            if available < params.amount {
                return Err(HtlcError::InsufficientFunds {
                    chain: ChainId::Eth,
                    needed: params.amount,
                    available,
                });
            }
            balances.insert(sender, available - params.amount);
        }
        self.escrowed.write().insert(lock_id, params.amount);

        let mut tag = b"escrow".to_vec();
        tag.extend_from_slice(&lock_id);
        debug!(
            "[sc-02] ETH escrow {} wei for {}",
            params.amount,
            short_hex(&lock_id)
        );
        Ok(EscrowReceipt {
            tx_ref: keccak256(&tag),
            escrow_address: format!("0x{}", hex::encode(self.contract)),
            redeem_script: None,
        })
    }

    async fn release(&self, lock: &Lock, preimage: &[u8]) -> Result<(), HtlcError> {
        self.ensure_available()?;
        self.pay_out(lock, &lock.recipient)?;
        self.revealed.write().insert(lock.lock_id, preimage.to_vec());
        Ok(())
    }

    async fn reclaim(&self, lock: &Lock) -> Result<(), HtlcError> {
        self.ensure_available()?;
        self.pay_out(lock, &lock.sender)
    }

    async fn balance(&self, who: &Participant) -> Result<U256, HtlcError> {
        self.ensure_available()?;
        let account = Self::account(who)?;
        Ok(self
            .balances
            .read()
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    async fn revealed_preimage(&self, lock_id: LockId) -> Result<Option<Vec<u8>>, HtlcError> {
        self.ensure_available()?;
        Ok(self.revealed.read().get(&lock_id).cloned())
    }
}
