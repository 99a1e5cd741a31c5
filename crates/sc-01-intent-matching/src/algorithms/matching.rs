//! # Matching
//!
//! Price-time priority matching of one buy intent against the sell book.
//!
//! For each eligible sell intent S, in ascending id order:
//!
//! ```text
//! eth = min(S.remaining_eth, B.eth_still_needed)
//! btc = min(eth * S.min_buy_amount_btc / S.sell_amount_eth, B.remaining_btc)
//! ```
//!
//! The conversion uses S's own advertised rate. An allocation that rounds to
//! zero on either leg is skipped, as is one whose effective rate falls below
//! B's target rate by more than B's slippage bound. Skipped sell intents are
//! not retried within the same match.

use crate::domain::{BuyIntent, IntentId, SellIntent, MAX_SLIPPAGE_BPS};
use serde::Serialize;
use shared_types::{Satoshi, Timestamp, U256};

/// Capacity moved from one sell intent to the buy intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Sell intent consumed.
    pub sell_intent_id: IntentId,
    /// ETH moved, in wei.
    pub eth_amount: U256,
    /// BTC moved, in satoshi.
    pub btc_amount: Satoshi,
}

/// Why a sell intent was passed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// One leg of the allocation rounded to zero.
    RoundsToZero,
    /// Effective rate outside the buyer's slippage bound.
    SlippageExceeded,
    /// Intermediate product does not fit 256 bits.
    Overflow,
}

/// Result of planning a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlan {
    /// Allocations in application order.
    pub allocations: Vec<Allocation>,
    /// Sell intents considered and rejected.
    pub skipped: Vec<(IntentId, SkipReason)>,
}

impl MatchPlan {
    /// Total ETH allocated.
    pub fn total_eth(&self) -> U256 {
        self.allocations
            .iter()
            .fold(U256::zero(), |acc, a| acc.saturating_add(a.eth_amount))
    }

    /// Total BTC allocated.
    pub fn total_btc(&self) -> u128 {
        self.allocations.iter().map(|a| u128::from(a.btc_amount)).sum()
    }
}

/// A sell intent can be matched: open, capacity left, deadline ahead.
pub fn is_eligible(sell: &SellIntent, now: Timestamp) -> bool {
    sell.status.is_open() && sell.deadline > now && !sell.remaining_eth().is_zero()
}

/// Size one allocation against a sell intent's advertised rate.
pub fn allocate(
    eth_needed: U256,
    btc_remaining: Satoshi,
    sell: &SellIntent,
) -> Result<(U256, Satoshi), SkipReason> {
    let eth = sell.remaining_eth().min(eth_needed);
    if eth.is_zero() || sell.sell_amount_eth.is_zero() {
        return Err(SkipReason::RoundsToZero);
    }

    let scaled = eth
        .checked_mul(U256::from(sell.min_buy_amount_btc))
        .ok_or(SkipReason::Overflow)?;
    let btc_at_rate = scaled / sell.sell_amount_eth;
    let btc = btc_at_rate.min(U256::from(btc_remaining)).low_u64();

    if btc == 0 {
        return Err(SkipReason::RoundsToZero);
    }
    Ok((eth, btc))
}

/// Effective rate `eth / btc` is at least the buyer's target rate
/// `min_buy_amount_eth / sell_amount_btc`, less `slippage_bps`.
pub fn within_slippage(buy: &BuyIntent, eth: U256, btc: Satoshi) -> Result<bool, SkipReason> {
    let bps = u64::from(buy.slippage_bps.min(MAX_SLIPPAGE_BPS));
    let lhs = eth
        .checked_mul(U256::from(buy.sell_amount_btc))
        .and_then(|v| v.checked_mul(U256::from(MAX_SLIPPAGE_BPS)))
        .ok_or(SkipReason::Overflow)?;
    let rhs = buy
        .min_buy_amount_eth
        .checked_mul(U256::from(btc))
        .and_then(|v| v.checked_mul(U256::from(u64::from(MAX_SLIPPAGE_BPS) - bps)))
        .ok_or(SkipReason::Overflow)?;
    Ok(lhs >= rhs)
}

/// Plan the allocations for `buy` against `sells`.
///
/// `sells` must be in ascending id order. Ineligible sell intents are
/// ignored silently; eligible ones that fail sizing or slippage are reported
/// in [`MatchPlan::skipped`].
pub fn plan_matches<'a, I>(buy: &BuyIntent, sells: I, now: Timestamp) -> MatchPlan
where
    I: IntoIterator<Item = &'a SellIntent>,
{
    let mut plan = MatchPlan::default();
    let mut eth_needed = buy.eth_still_needed();
    let mut btc_remaining = buy.remaining_btc();

    for sell in sells {
        if eth_needed.is_zero() || btc_remaining == 0 {
            break;
        }
        if !is_eligible(sell, now) {
            continue;
        }

        let (eth, btc) = match allocate(eth_needed, btc_remaining, sell) {
            Ok(sized) => sized,
            Err(reason) => {
                plan.skipped.push((sell.id, reason));
                continue;
            }
        };

        match within_slippage(buy, eth, btc) {
            Ok(true) => {}
            Ok(false) => {
                plan.skipped.push((sell.id, SkipReason::SlippageExceeded));
                continue;
            }
            Err(reason) => {
                plan.skipped.push((sell.id, reason));
                continue;
            }
        }

        eth_needed = eth_needed.saturating_sub(eth);
        btc_remaining -= btc;
        plan.allocations.push(Allocation {
            sell_intent_id: sell.id,
            eth_amount: eth,
            btc_amount: btc,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{offchain_id, IntentStatus};
    use shared_types::{eth_to_wei, SATS_PER_BTC};

    const NOW: Timestamp = 1_700_000_000;

    fn buy(btc: u64, eth: u64, slippage_bps: u16) -> BuyIntent {
        BuyIntent {
            id: 0,
            buyer: [1u8; 20],
            sell_amount_btc: btc,
            min_buy_amount_eth: eth_to_wei(eth),
            locktime: NOW + 3_600,
            offchain_id: offchain_id("buy-eth"),
            slippage_bps,
            status: IntentStatus::Pending,
            filled_btc: 0,
            received_eth: U256::zero(),
            created_at: NOW,
        }
    }

    fn sell(id: IntentId, eth: u64, min_btc: u64) -> SellIntent {
        SellIntent {
            id,
            seller: [2u8; 20],
            sell_amount_eth: eth_to_wei(eth),
            min_buy_amount_btc: min_btc,
            deadline: NOW + 3_600,
            offchain_id: offchain_id("sell-eth"),
            status: IntentStatus::Pending,
            filled_eth: U256::zero(),
            received_btc: 0,
            created_at: NOW,
        }
    }

    #[test]
    fn test_single_sell_fills_buy() {
        // 2 BTC for 10 ETH against 20 ETH for 9 BTC
        let b = buy(2 * SATS_PER_BTC, 10, 0);
        let s = sell(0, 20, 9 * SATS_PER_BTC);
        let plan = plan_matches(&b, [&s], NOW);

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].eth_amount, eth_to_wei(10));
        assert_eq!(plan.allocations[0].btc_amount, 2 * SATS_PER_BTC);
    }

    #[test]
    fn test_walks_book_in_order() {
        // 2 BTC for 10 ETH; two sells at the buyer's rate of 5 ETH/BTC
        let b = buy(2 * SATS_PER_BTC, 10, 0);
        let s0 = sell(0, 5, SATS_PER_BTC);
        let s1 = sell(1, 15, 3 * SATS_PER_BTC);
        let plan = plan_matches(&b, [&s0, &s1], NOW);

        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(plan.allocations[0].sell_intent_id, 0);
        assert_eq!(plan.allocations[0].eth_amount, eth_to_wei(5));
        assert_eq!(plan.allocations[0].btc_amount, SATS_PER_BTC);
        assert_eq!(plan.allocations[1].eth_amount, eth_to_wei(5));
        assert_eq!(plan.allocations[1].btc_amount, SATS_PER_BTC);
        assert_eq!(plan.total_eth(), eth_to_wei(10));
    }

    #[test]
    fn test_slippage_skips_expensive_sell() {
        // Seller wants 2 BTC for 5 ETH: 2.5 ETH/BTC, target is 5 ETH/BTC
        let b = buy(2 * SATS_PER_BTC, 10, 100);
        let s0 = sell(0, 5, 2 * SATS_PER_BTC);
        let plan = plan_matches(&b, [&s0], NOW);

        assert!(plan.allocations.is_empty());
        assert_eq!(plan.skipped, vec![(0, SkipReason::SlippageExceeded)]);
    }

    #[test]
    fn test_slippage_tolerance_admits_near_rate() {
        // 4.9 ETH for 1 BTC against a 5 ETH/BTC target: 2% short
        let b = buy(SATS_PER_BTC, 5, 250);
        let mut s0 = sell(0, 5, SATS_PER_BTC);
        s0.sell_amount_eth = eth_to_wei(49) / U256::from(10u64);
        let plan = plan_matches(&b, [&s0], NOW);
        assert_eq!(plan.allocations.len(), 1);

        let strict = buy(SATS_PER_BTC, 5, 100);
        let plan = plan_matches(&strict, [&s0], NOW);
        assert!(plan.allocations.is_empty());
    }

    #[test]
    fn test_zero_btc_allocation_skipped() {
        // Seller asks 1 satoshi for 20 ETH; 1 wei rounds the BTC leg to zero
        let mut b = buy(2 * SATS_PER_BTC, 10, 0);
        b.received_eth = eth_to_wei(10) - U256::one();
        let s0 = sell(0, 20, 1);
        let plan = plan_matches(&b, [&s0], NOW);

        assert!(plan.allocations.is_empty());
        assert_eq!(plan.skipped, vec![(0, SkipReason::RoundsToZero)]);
    }

    #[test]
    fn test_expired_and_closed_sells_ignored() {
        let b = buy(2 * SATS_PER_BTC, 10, 0);
        let mut expired = sell(0, 20, 4 * SATS_PER_BTC);
        expired.deadline = NOW;
        let mut cancelled = sell(1, 20, 4 * SATS_PER_BTC);
        cancelled.status = IntentStatus::Cancelled;
        let plan = plan_matches(&b, [&expired, &cancelled], NOW);

        assert!(plan.allocations.is_empty());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_btc_never_exceeds_offer() {
        let b = buy(SATS_PER_BTC, 10, 10_000);
        let s0 = sell(0, 4, 4 * SATS_PER_BTC);
        let s1 = sell(1, 6, 6 * SATS_PER_BTC);
        let plan = plan_matches(&b, [&s0, &s1], NOW);

        assert!(plan.total_btc() <= u128::from(SATS_PER_BTC));
    }
}
