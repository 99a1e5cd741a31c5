//! # SC-01 Intent Ledger & Matching Engine
//!
//! Records buy and sell intents and pairs them into matched trades.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A buy intent offers BTC (satoshi) for a minimum amount of ETH (wei). A sell
//! intent offers ETH for a minimum amount of BTC. Matching scans open sell
//! intents in ascending id order (price-time priority), allocates capacity at
//! each sell intent's own advertised rate and appends one [`MatchedTrade`] per
//! pairing.
//!
//! ## Guarantees
//!
//! | Property | Enforcement |
//! |----------|-------------|
//! | Monotonic status | [`IntentStatus::can_transition_to`] |
//! | No overfill | fills checked against original amounts before commit |
//! | Conservation | Σ matched BTC ≤ buy intent's BTC, Σ matched ETH ≤ consumed sell capacity |
//! | Idempotent matching | Filled or Cancelled buy intents yield no new trades |
//! | Append-only trades | trades are never mutated; lock links live beside them |
//!
//! ## Module Structure
//!
//! ```text
//! sc-01-intent-matching/
//! ├── domain/          # BuyIntent, SellIntent, MatchedTrade, status, errors
//! ├── algorithms/      # Allocation and slippage rules
//! ├── ports/           # IntentApi
//! └── service.rs       # IntentLedger
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use algorithms::{allocate, is_eligible, plan_matches, within_slippage, Allocation, MatchPlan, SkipReason};
pub use domain::{
    offchain_id, BuyIntent, BuyIntentSpec, IntentError, IntentId, IntentSnapshot, IntentStatus,
    MatchedTrade, SellIntent, SellIntentSpec, Side, TradeId, MAX_SLIPPAGE_BPS,
};
pub use ports::IntentApi;
pub use service::IntentLedger;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
