//! # Domain Entities
//!
//! Buy intents, sell intents and the trades matching produces.

use super::value_objects::{IntentId, IntentStatus, TradeId};
use serde::{Deserialize, Serialize};
use shared_types::{keccak256, Address, Hash, Satoshi, Timestamp, U256};

/// Derive the off-chain correlation id from a free-form label.
pub fn offchain_id(label: &str) -> Hash {
    keccak256(label.as_bytes())
}

/// Parameters of a new buy intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyIntentSpec {
    /// ETH address receiving the bought ETH.
    #[serde(with = "shared_types::hex_serde")]
    pub buyer: Address,
    /// BTC offered, in satoshi.
    pub sell_amount_btc: Satoshi,
    /// Minimum ETH wanted in return, in wei.
    pub min_buy_amount_eth: U256,
    /// Absolute deadline; becomes the ETH lock timelock of every trade.
    pub locktime: Timestamp,
    /// Label hashed into the off-chain id.
    pub offchain_label: String,
    /// Tolerated shortfall against the target rate, in basis points.
    #[serde(default)]
    pub slippage_bps: u16,
}

/// Parameters of a new sell intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellIntentSpec {
    /// ETH address providing the ETH.
    #[serde(with = "shared_types::hex_serde")]
    pub seller: Address,
    /// ETH offered, in wei.
    pub sell_amount_eth: U256,
    /// Minimum BTC wanted for the whole amount, in satoshi.
    pub min_buy_amount_btc: Satoshi,
    /// Absolute deadline after which the intent is ignored by matching.
    pub deadline: Timestamp,
    /// Label hashed into the off-chain id.
    pub offchain_label: String,
}

/// A recorded buy intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyIntent {
    /// Ledger id.
    pub id: IntentId,
    /// ETH recipient.
    #[serde(with = "shared_types::hex_serde")]
    pub buyer: Address,
    /// BTC offered, in satoshi.
    pub sell_amount_btc: Satoshi,
    /// Minimum ETH wanted, in wei.
    pub min_buy_amount_eth: U256,
    /// Absolute deadline.
    pub locktime: Timestamp,
    /// keccak256 of the submitter's label.
    #[serde(with = "shared_types::hex_serde")]
    pub offchain_id: Hash,
    /// Slippage bound in basis points.
    pub slippage_bps: u16,
    /// Lifecycle status.
    pub status: IntentStatus,
    /// BTC already committed to trades.
    pub filled_btc: Satoshi,
    /// ETH already allocated from sell intents.
    pub received_eth: U256,
    /// Submission time.
    pub created_at: Timestamp,
}

impl BuyIntent {
    /// BTC not yet committed.
    pub fn remaining_btc(&self) -> Satoshi {
        self.sell_amount_btc.saturating_sub(self.filled_btc)
    }

    /// ETH still needed to reach the minimum.
    pub fn eth_still_needed(&self) -> U256 {
        self.min_buy_amount_eth.saturating_sub(self.received_eth)
    }

    /// Status implied by the current fill.
    pub fn derived_status(&self) -> IntentStatus {
        if self.eth_still_needed().is_zero() || self.remaining_btc() == 0 {
            IntentStatus::Filled
        } else if self.filled_btc > 0 || !self.received_eth.is_zero() {
            IntentStatus::Partial
        } else {
            IntentStatus::Pending
        }
    }
}

/// A recorded sell intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellIntent {
    /// Ledger id.
    pub id: IntentId,
    /// ETH provider.
    #[serde(with = "shared_types::hex_serde")]
    pub seller: Address,
    /// ETH offered, in wei.
    pub sell_amount_eth: U256,
    /// Minimum BTC for the whole amount, in satoshi.
    pub min_buy_amount_btc: Satoshi,
    /// Absolute deadline.
    pub deadline: Timestamp,
    /// keccak256 of the submitter's label.
    #[serde(with = "shared_types::hex_serde")]
    pub offchain_id: Hash,
    /// Lifecycle status.
    pub status: IntentStatus,
    /// ETH already allocated to trades.
    pub filled_eth: U256,
    /// BTC already committed by buyers.
    pub received_btc: Satoshi,
    /// Submission time.
    pub created_at: Timestamp,
}

impl SellIntent {
    /// ETH capacity left.
    pub fn remaining_eth(&self) -> U256 {
        self.sell_amount_eth.saturating_sub(self.filled_eth)
    }

    /// Status implied by the current fill.
    pub fn derived_status(&self) -> IntentStatus {
        if self.remaining_eth().is_zero() {
            IntentStatus::Filled
        } else if !self.filled_eth.is_zero() {
            IntentStatus::Partial
        } else {
            IntentStatus::Pending
        }
    }
}

/// One (buy, sell) pairing produced by a match. Never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedTrade {
    /// Ledger-wide sequential id.
    pub trade_id: TradeId,
    /// Position of this trade among the buy intent's trades.
    pub batch_index: u64,
    /// Buy side.
    pub buy_intent_id: IntentId,
    /// Sell side.
    pub sell_intent_id: IntentId,
    /// Who triggered the match.
    #[serde(with = "shared_types::hex_serde")]
    pub executor: Address,
    /// ETH recipient (the buyer).
    #[serde(with = "shared_types::hex_serde")]
    pub recipient: Address,
    /// ETH provider (the seller).
    #[serde(with = "shared_types::hex_serde")]
    pub seller: Address,
    /// ETH moved, in wei.
    pub eth_amount: U256,
    /// BTC moved, in satoshi.
    pub btc_amount: Satoshi,
    /// ETH lock timelock (the buy intent's locktime).
    pub locktime: Timestamp,
    /// Match time.
    pub timestamp: Timestamp,
}

/// Point-in-time copy of the whole book.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSnapshot {
    /// Buy intents in id order.
    pub buy_intents: Vec<BuyIntent>,
    /// Sell intents in id order.
    pub sell_intents: Vec<SellIntent>,
}
