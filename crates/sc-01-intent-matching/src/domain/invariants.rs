//! # Domain Invariants
//!
//! Rules checked on working copies before a match is committed.

use super::entities::{BuyIntent, MatchedTrade, SellIntent};
use super::errors::IntentError;
use super::value_objects::{IntentStatus, Side};
use shared_types::U256;

/// Invariant: status only moves forward.
pub fn invariant_status_transition(
    from: IntentStatus,
    to: IntentStatus,
) -> Result<(), IntentError> {
    if !from.can_transition_to(to) {
        return Err(IntentError::InvalidTransition { from, to });
    }
    Ok(())
}

/// Invariant: a buy intent never commits more BTC than it offered.
pub fn invariant_buy_within_bounds(buy: &BuyIntent) -> Result<(), IntentError> {
    if buy.filled_btc > buy.sell_amount_btc {
        return Err(IntentError::Overfill {
            side: Side::Buy,
            id: buy.id,
        });
    }
    Ok(())
}

/// Invariant: a sell intent never gives more ETH than it offered.
pub fn invariant_sell_within_bounds(sell: &SellIntent) -> Result<(), IntentError> {
    if sell.filled_eth > sell.sell_amount_eth {
        return Err(IntentError::Overfill {
            side: Side::Sell,
            id: sell.id,
        });
    }
    Ok(())
}

/// Invariant: conservation across a buy intent's trades.
///
/// Σ BTC ≤ the buy intent's offered BTC, and Σ ETH equals what the buy
/// intent recorded as received.
pub fn invariant_conservation(buy: &BuyIntent, trades: &[MatchedTrade]) -> bool {
    let mut total_btc: u128 = 0;
    let mut total_eth = U256::zero();
    for trade in trades.iter().filter(|t| t.buy_intent_id == buy.id) {
        total_btc += u128::from(trade.btc_amount);
        total_eth = total_eth.saturating_add(trade.eth_amount);
    }
    total_btc <= u128::from(buy.sell_amount_btc)
        && total_btc == u128::from(buy.filled_btc)
        && total_eth == buy.received_eth
}
