//! # Subsystem Container
//!
//! Builds the four subsystems in dependency order and registers the
//! multisig's call targets:
//!
//! ```text
//! Intent Ledger (1) ─┐
//! HTLC (2) ──────────┼──→ Multisig (3) targets
//! Secret Bridge (4) ─┘    HTLC ← NewLock / Withdraw / Refund
//!                         Intent Ledger ← CreateSellIntent / AssociateLock
//! ```
//!
//! The interchange log is opened first: buy intent ids resume after the
//! highest batch it already holds, so a restarted ledger never reuses one.

use super::config::{contracts, RuntimeConfig};
use crate::adapters::{HtlcTarget, IntentTarget};
use sc_01_intent_matching::{IntentApi, IntentError, IntentLedger};
use sc_02_htlc::{HtlcConfig, HtlcCoordinator, InMemoryBtcEscrow, InMemoryEthEscrow};
use sc_03_multisig::{MultisigError, MultisigWallet, OwnerSet};
use sc_04_secret_bridge::{
    BridgeError, FileInterchangeLog, InMemoryInterchangeLog, InterchangeLog, SecretBridge,
};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Failures while wiring subsystems.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Owner set rejected by the multisig.
    #[error("Multisig setup failed: {0}")]
    Multisig(#[from] MultisigError),

    /// Interchange log could not be opened.
    #[error("Interchange log unavailable: {0}")]
    Interchange(#[from] BridgeError),

    /// Intent ledger rejected its setup.
    #[error("Intent ledger setup failed: {0}")]
    Intents(#[from] IntentError),
}

/// Every subsystem instance, shared by handlers.
pub struct SwapContainer {
    /// Configuration the container was built from.
    pub config: RuntimeConfig,
    /// Clock shared by every subsystem.
    pub time_source: Arc<dyn TimeSource>,
    /// Subsystem 1.
    pub intents: Arc<IntentLedger>,
    /// Subsystem 2.
    pub htlc: Arc<HtlcCoordinator>,
    /// ETH chain adapter behind subsystem 2.
    pub eth_chain: Arc<InMemoryEthEscrow>,
    /// BTC chain adapter behind subsystem 2.
    pub btc_chain: Arc<InMemoryBtcEscrow>,
    /// Subsystem 3.
    pub multisig: Arc<MultisigWallet>,
    /// Subsystem 4.
    pub bridge: Arc<SecretBridge>,
}

impl SwapContainer {
    /// Wire subsystems on the system clock.
    pub fn new(config: RuntimeConfig) -> Result<Self, ContainerError> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Wire subsystems on a given clock.
    pub fn with_time_source(
        config: RuntimeConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, ContainerError> {
        info!("[runtime] Initializing subsystems");

        let log: Arc<dyn InterchangeLog> = match &config.interchange_path {
            Some(path) => {
                info!("[runtime] [sc-04] Interchange log at {}", path.display());
                Arc::new(FileInterchangeLog::open(path)?)
            }
            None => {
                info!("[runtime] [sc-04] Interchange log in memory");
                Arc::new(InMemoryInterchangeLog::new())
            }
        };
        let first_buy_id = log.buy_intent_ids()?.last().map_or(0, |id| id + 1);
        let bridge = Arc::new(SecretBridge::new(log, Arc::clone(&time_source)));

        let intents = Arc::new(
            IntentLedger::new(Arc::clone(&time_source)).with_first_buy_id(first_buy_id),
        );
        intents.set_market_maker(config.market_maker())?;
        info!(
            "[runtime] [sc-01] Intent ledger ready (buy ids from {})",
            first_buy_id
        );

        let eth_chain = Arc::new(InMemoryEthEscrow::new(contracts::HTLC));
        let btc_chain = Arc::new(InMemoryBtcEscrow::new(config.btc_network.0));
        let htlc = Arc::new(HtlcCoordinator::new(
            HtlcConfig {
                min_timelock_margin_secs: config.htlc.timelock_margin_secs,
            },
            eth_chain.clone(),
            btc_chain.clone(),
            Arc::clone(&time_source),
        ));
        info!(
            "[runtime] [sc-02] HTLC coordinator ready (btc network {})",
            config.btc_network.0
        );

        let owners = OwnerSet::new(config.multisig.owners.clone(), config.multisig.threshold)?;
        let multisig = Arc::new(MultisigWallet::new(
            config.multisig.address,
            owners,
            Arc::clone(&time_source),
        ));
        multisig.register_target(contracts::HTLC, Arc::new(HtlcTarget::new(htlc.clone())));
        multisig.register_target(
            contracts::INTENT_LEDGER,
            Arc::new(IntentTarget::new(intents.clone())),
        );
        info!(
            "[runtime] [sc-03] Multisig ready ({}-of-{})",
            config.multisig.threshold,
            config.multisig.owners.len()
        );

        Ok(Self {
            config,
            time_source,
            intents,
            htlc,
            eth_chain,
            btc_chain,
            multisig,
            bridge,
        })
    }
}
