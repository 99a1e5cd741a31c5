//! # Domain Value Objects
//!
//! Intent status machine and side marker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a buy or sell intent (one counter per side).
pub type IntentId = u64;

/// Ledger-assigned identifier of a matched trade.
pub type TradeId = u64;

/// Upper bound for slippage, 100%.
pub const MAX_SLIPPAGE_BPS: u16 = 10_000;

/// Which side of the book an intent sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Offers BTC, wants ETH.
    Buy,
    /// Offers ETH, wants BTC.
    Sell,
}

impl Side {
    /// Metric / log label.
    pub fn label(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Intent lifecycle.
///
/// ```text
/// Pending ──→ Partial ──→ Filled
///    │           │
///    └───────────┴──→ Cancelled
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentStatus {
    /// Accepted, nothing filled.
    #[default]
    Pending,
    /// Some capacity filled.
    Partial,
    /// Fully filled.
    Filled,
    /// Withdrawn by its owner.
    Cancelled,
}

impl IntentStatus {
    /// Check if transition is valid. Staying `Partial` is allowed.
    pub fn can_transition_to(&self, next: IntentStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Pending) => true,
            (Self::Pending, Self::Partial) => true,
            (Self::Pending, Self::Filled) => true,
            (Self::Partial, Self::Partial) => true,
            (Self::Partial, Self::Filled) => true,
            (Self::Pending, Self::Cancelled) => true,
            (Self::Partial, Self::Cancelled) => true,
            _ => false,
        }
    }

    /// Still able to take part in a match.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
