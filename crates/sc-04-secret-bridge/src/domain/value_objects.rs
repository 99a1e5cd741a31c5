//! # Domain Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Buy intent a batch belongs to.
pub type BuyIntentId = u64;

/// Position of a trade within its batch.
pub type TradeIndex = u64;

/// How the locks of one batch derive their hashes. Declared per batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecretPolicy {
    /// Every lock commits to the base secret; one reveal opens the batch.
    SharedHash,
    /// Lock `i` commits to `base ‖ i`; reveals are isolated per trade.
    PerTradeSalted,
}

impl fmt::Display for SecretPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretPolicy::SharedHash => f.write_str("sharedHash"),
            SecretPolicy::PerTradeSalted => f.write_str("perTradeSalted"),
        }
    }
}
