//! In-memory BTC escrow.
//!
//! A UTXO set keyed by outpoint. Escrow spends the sender's P2PKH outputs
//! into a P2SH output of the lock script and returns change; release and
//! reclaim spend that output to the recipient or the sender.

use crate::algorithms::{build_htlc_script, escrow_address, owner_address};
use crate::domain::{EscrowReceipt, HtlcError, Lock, LockId, LockParams, Participant, Utxo};
use crate::ports::ChainEscrow;
use async_trait::async_trait;
use bitcoin::{Network, PublicKey};
use parking_lot::RwLock;
use shared_types::{sha256, short_hex, ChainId, Hash, Satoshi, U256};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Default)]
struct UtxoSet {
    unspent: BTreeMap<(Hash, u32), Utxo>,
    escrow_outputs: HashMap<LockId, Utxo>,
    revealed: HashMap<LockId, Vec<u8>>,
    tx_count: u64,
}

impl UtxoSet {
    fn next_txid(&mut self, tag: &[u8]) -> Hash {
        self.tx_count += 1;
        let mut buf = tag.to_vec();
        buf.extend_from_slice(&self.tx_count.to_be_bytes());
        sha256(&sha256(&buf))
    }

    fn add_output(&mut self, txid: Hash, vout: u32, value: Satoshi, address: String) -> Utxo {
        let utxo = Utxo {
            txid,
            vout,
            value,
            address,
        };
        self.unspent.insert((txid, vout), utxo.clone());
        utxo
    }
}

/// BTC escrow adapter backed by memory.
pub struct InMemoryBtcEscrow {
    network: Network,
    state: RwLock<UtxoSet>,
    unavailable: AtomicBool,
}

impl InMemoryBtcEscrow {
    /// Create an empty UTXO set on `network`.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            state: RwLock::new(UtxoSet::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Network addresses are rendered for.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Create a new output paying `value` to the key's P2PKH address.
    pub fn fund(&self, owner: &PublicKey, value: Satoshi) -> Utxo {
        let address = owner_address(owner, self.network).to_string();
        let mut state = self.state.write();
        let txid = state.next_txid(b"faucet");
        state.add_output(txid, 0, value, address)
    }

    /// Total held in lock scripts.
    pub fn total_escrowed(&self) -> U256 {
        sum_values(self.state.read().escrow_outputs.values())
    }

    /// Make every chain call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), HtlcError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HtlcError::ChainUnavailable {
                chain: ChainId::Btc,
                reason: "rpc endpoint unreachable".into(),
            });
        }
        Ok(())
    }

    fn key(who: &Participant) -> Result<&PublicKey, HtlcError> {
        match who {
            Participant::Btc(key) => Ok(key),
            other => Err(HtlcError::ChainMismatch {
                expected: ChainId::Btc,
                got: other.chain(),
            }),
        }
    }

    fn spend_escrow(&self, lock: &Lock, to: &Participant, tag: &[u8]) -> Result<(), HtlcError> {
        let address = owner_address(Self::key(to)?, self.network).to_string();
        let mut state = self.state.write();
        let escrowed = state
            .escrow_outputs
            .remove(&lock.lock_id)
            .ok_or_else(|| HtlcError::ChainUnavailable {
                chain: ChainId::Btc,
                reason: format!("no escrow output for {}", short_hex(&lock.lock_id)),
            })?;
        state.unspent.remove(&(escrowed.txid, escrowed.vout));
        let txid = state.next_txid(tag);
        state.add_output(txid, 0, escrowed.value, address);
        Ok(())
    }
}

fn sum_values<'a>(utxos: impl IntoIterator<Item = &'a Utxo>) -> U256 {
    utxos
        .into_iter()
        .fold(U256::zero(), |acc, u| acc + U256::from(u.value))
}

#[async_trait]
impl ChainEscrow for InMemoryBtcEscrow {
    fn chain(&self) -> ChainId {
        ChainId::Btc
    }

    async fn escrow(
        &self,
        lock_id: LockId,
        params: &LockParams,
    ) -> Result<EscrowReceipt, HtlcError> {
        self.ensure_available()?;
        let sender = Self::key(&params.sender)?;
        let recipient = Self::key(&params.recipient)?;
        if params.amount > U256::from(u64::MAX) {
            return Err(HtlcError::InvalidAmount(format!(
                "{} exceeds satoshi range",
                params.amount
            )));
        }
        let amount = params.amount.low_u64();

        let script = build_htlc_script(params.hash_lock.sha256, recipient, sender, params.timelock)?;
        let p2sh = escrow_address(&script, self.network)?.to_string();
        let sender_address = owner_address(sender, self.network).to_string();

        let mut state = self.state.write();

        // Coin selection in outpoint order
        let mut selected = Vec::new();
        let mut total: u128 = 0;
        for (outpoint, utxo) in state.unspent.iter() {
            if total >= u128::from(amount) {
                break;
            }
            if utxo.address == sender_address {
                selected.push(*outpoint);
                total += u128::from(utxo.value);
            }
        }
        if total < u128::from(amount) {
            return Err(HtlcError::InsufficientFunds {
                chain: ChainId::Btc,
                needed: params.amount,
                available: U256::from(total),
            });
        }
        // Below the last selected output, so within satoshi range.
        let change = (total - u128::from(amount)) as Satoshi;

        for outpoint in &selected {
            state.unspent.remove(outpoint);
        }
        let txid = state.next_txid(&lock_id);
        let escrow_output = state.add_output(txid, 0, amount, p2sh.clone());
        state.escrow_outputs.insert(lock_id, escrow_output);
        if change > 0 {
            state.add_output(txid, 1, change, sender_address);
        }

        debug!(
            "[sc-02] BTC escrow {} sat to {} for {} ({} input(s))",
            amount,
            p2sh,
            short_hex(&lock_id),
            selected.len()
        );
        Ok(EscrowReceipt {
            tx_ref: txid,
            escrow_address: p2sh,
            redeem_script: Some(hex::encode(script.as_bytes())),
        })
    }

    async fn release(&self, lock: &Lock, preimage: &[u8]) -> Result<(), HtlcError> {
        self.ensure_available()?;
        self.spend_escrow(lock, &lock.recipient, b"claim")?;
        self.state
            .write()
            .revealed
            .insert(lock.lock_id, preimage.to_vec());
        Ok(())
    }

    async fn reclaim(&self, lock: &Lock) -> Result<(), HtlcError> {
        self.ensure_available()?;
        self.spend_escrow(lock, &lock.sender, b"refund")
    }

    async fn balance(&self, who: &Participant) -> Result<U256, HtlcError> {
        Ok(sum_values(&self.utxos(who).await?))
    }

    async fn revealed_preimage(&self, lock_id: LockId) -> Result<Option<Vec<u8>>, HtlcError> {
        self.ensure_available()?;
        Ok(self.state.read().revealed.get(&lock_id).cloned())
    }

    async fn utxos(&self, who: &Participant) -> Result<Vec<Utxo>, HtlcError> {
        self.ensure_available()?;
        let address = owner_address(Self::key(who)?, self.network).to_string();
        Ok(self
            .state
            .read()
            .unspent
            .values()
            .filter(|u| u.address == address)
            .cloned()
            .collect())
    }
}
