//! Shared fixtures: a runtime wired on a manual clock, keys and intents.

use bitcoin::secp256k1::{Secp256k1, SecretKey};
use sc_01_intent_matching::{BuyIntentSpec, IntentApi, IntentId, SellIntentSpec};
use sc_02_htlc::Participant;
use sc_03_multisig::MultisigApi;
use shared_types::{eth_to_wei, Address, ManualTimeSource, Satoshi, SATS_PER_BTC, U256};
use std::sync::Arc;
use swap_runtime::{RuntimeConfig, SwapContainer, SwapFlow};

/// Fixed start of every test clock.
pub const NOW: u64 = 1_700_000_000;
/// ETH leg deadline of fixture buy intents.
pub const ETH_LOCKTIME: u64 = NOW + 3_600;
/// Gap required between the two legs.
pub const MARGIN: u64 = 600;

/// ETH recipient of the buyer.
pub const BUYER: Address = [0x01; 20];
/// First ETH seller.
pub const SELLER: Address = [0x02; 20];
/// Second ETH seller.
pub const SELLER_2: Address = [0x03; 20];

/// Deterministic compressed BTC key.
pub fn btc_key(seed: u8) -> bitcoin::PublicKey {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&[seed; 32]).expect("valid secret key");
    bitcoin::PublicKey::new(bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &sk))
}

/// BTC key of the buyer (sender of the BTC leg).
pub fn buyer_btc() -> bitcoin::PublicKey {
    btc_key(0x11)
}

/// BTC key of the seller (recipient of the BTC leg).
pub fn seller_btc() -> bitcoin::PublicKey {
    btc_key(0x22)
}

/// Buy intent offering `btc` sat for at least `eth` whole ETH.
pub fn buy_spec(btc: Satoshi, eth: u64) -> BuyIntentSpec {
    BuyIntentSpec {
        buyer: BUYER,
        sell_amount_btc: btc,
        min_buy_amount_eth: eth_to_wei(eth),
        locktime: ETH_LOCKTIME,
        offchain_label: "buy-eth".to_string(),
        slippage_bps: 0,
    }
}

/// Sell intent offering `eth` whole ETH for at least `min_btc` sat.
pub fn sell_spec(seller: Address, eth: u64, min_btc: Satoshi) -> SellIntentSpec {
    SellIntentSpec {
        seller,
        sell_amount_eth: eth_to_wei(eth),
        min_buy_amount_btc: min_btc,
        deadline: ETH_LOCKTIME,
        offchain_label: "sell-eth".to_string(),
    }
}

/// The runtime's subsystems and swap flow on a manual clock.
pub struct Harness {
    pub container: Arc<SwapContainer>,
    pub flow: SwapFlow,
    pub clock: Arc<ManualTimeSource>,
}

impl Harness {
    /// Default configuration with a timelock margin.
    pub fn new() -> Self {
        let mut config = RuntimeConfig::default();
        config.htlc.timelock_margin_secs = MARGIN;
        Self::with_config(config)
    }

    /// Wire a given configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let container = Arc::new(
            SwapContainer::with_time_source(config, clock.clone()).expect("container wires"),
        );
        let flow = SwapFlow::new(&container);
        Self {
            container,
            flow,
            clock,
        }
    }

    /// Custody participant of the multisig.
    pub fn custody(&self) -> Participant {
        Participant::Eth(self.container.multisig.address())
    }

    /// Credit the multisig custody with whole ETH.
    pub fn fund_custody(&self, eth: u64) -> U256 {
        self.container
            .eth_chain
            .fund(self.container.multisig.address(), eth_to_wei(eth))
    }

    /// Credit the buyer's BTC key.
    pub fn fund_buyer_btc(&self, btc: u64) {
        self.container
            .btc_chain
            .fund(&buyer_btc(), btc * SATS_PER_BTC);
    }

    /// Offer `eth` whole custody ETH for at least `min_btc` sat through the
    /// multisig, as the market maker.
    pub async fn offer_sell(&self, eth: u64, min_btc: Satoshi) -> IntentId {
        let approvers = self.flow.default_approvers();
        let (_, id) = self
            .flow
            .create_sell_intent(
                eth_to_wei(eth),
                min_btc,
                ETH_LOCKTIME,
                "sell-eth".to_string(),
                &approvers,
            )
            .await
            .expect("sell accepted");
        id
    }

    /// Submit a buy intent and the given `(eth, min_btc)` offers, then match.
    pub async fn matched_batch(&self, buy: BuyIntentSpec, offers: &[(u64, Satoshi)]) -> IntentId {
        let intents = &self.container.intents;
        let buy_id = intents.submit_buy_intent(buy).await.expect("buy accepted");
        for &(eth, min_btc) in offers {
            self.offer_sell(eth, min_btc).await;
        }
        intents
            .match_intent(buy_id, self.container.multisig.address())
            .await
            .expect("match succeeds");
        buy_id
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
