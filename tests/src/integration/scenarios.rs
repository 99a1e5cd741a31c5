//! # Matching and Lock Lifecycle Scenarios
//!
//! Intent ledger and HTLC coordinator exercised directly on a manual clock.

#[cfg(test)]
mod tests {
    use crate::fixtures::{buy_spec, sell_spec, BUYER, NOW, SELLER, SELLER_2};
    use primitive_types::U256;
    use sc_01_intent_matching::{IntentApi, IntentLedger, IntentStatus};
    use sc_02_htlc::{
        HtlcApi, HtlcConfig, HtlcCoordinator, HtlcError, InMemoryBtcEscrow, InMemoryEthEscrow,
        LockParams, LockState, Participant,
    };
    use shared_types::{eth_to_wei, ChainId, HashLock, ManualTimeSource, SATS_PER_BTC};
    use std::sync::Arc;

    const EXECUTOR: [u8; 20] = [0xEE; 20];
    const HTLC_CONTRACT: [u8; 20] = [0x48; 20];
    const PREIMAGE: &[u8] = b"scenario preimage";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn ledger() -> IntentLedger {
        IntentLedger::new(Arc::new(ManualTimeSource::new(NOW)))
    }

    struct Htlc {
        coordinator: Arc<HtlcCoordinator>,
        eth: Arc<InMemoryEthEscrow>,
        clock: Arc<ManualTimeSource>,
    }

    fn htlc() -> Htlc {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let eth = Arc::new(InMemoryEthEscrow::new(HTLC_CONTRACT));
        let btc = Arc::new(InMemoryBtcEscrow::new(bitcoin::Network::Regtest));
        let coordinator = Arc::new(HtlcCoordinator::new(
            HtlcConfig::default(),
            eth.clone(),
            btc,
            clock.clone(),
        ));
        Htlc {
            coordinator,
            eth,
            clock,
        }
    }

    async fn eth_balance(h: &Htlc, account: [u8; 20]) -> U256 {
        h.coordinator
            .balance(&Participant::Eth(account))
            .await
            .unwrap()
    }

    async fn eth_lock(h: &Htlc) -> [u8; 32] {
        h.eth.fund(SELLER, eth_to_wei(10));
        let lock = h
            .coordinator
            .create_lock(LockParams {
                chain: ChainId::Eth,
                sender: Participant::Eth(SELLER),
                recipient: Participant::Eth(BUYER),
                hash_lock: HashLock::of(PREIMAGE),
                timelock: NOW + 3_600,
                amount: eth_to_wei(10),
            })
            .await
            .unwrap();
        lock.lock_id
    }

    // =============================================================================
    // MATCHING
    // =============================================================================

    /// One trade fills the buy and half the sell.
    #[tokio::test]
    async fn test_single_sell_fills_buy_partially_consumes_sell() {
        let ledger = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        let sell = ledger
            .submit_sell_intent(sell_spec(SELLER, 20, 9 * SATS_PER_BTC))
            .await
            .unwrap();

        let trades = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].eth_amount, eth_to_wei(10));
        assert_eq!(trades[0].btc_amount, 2 * SATS_PER_BTC);

        assert_eq!(
            ledger.get_buy_intent(buy).unwrap().status,
            IntentStatus::Filled
        );
        let s = ledger.get_sell_intent(sell).unwrap();
        assert_eq!(s.status, IntentStatus::Partial);
        assert_eq!(s.remaining_eth(), eth_to_wei(10));
    }

    #[tokio::test]
    async fn test_matching_filled_intent_is_idempotent() {
        let ledger = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(2 * SATS_PER_BTC, 10))
            .await
            .unwrap();
        ledger
            .submit_sell_intent(sell_spec(SELLER, 20, 9 * SATS_PER_BTC))
            .await
            .unwrap();

        assert_eq!(ledger.match_intent(buy, EXECUTOR).await.unwrap().len(), 1);
        assert!(ledger.match_intent(buy, EXECUTOR).await.unwrap().is_empty());
        assert_eq!(ledger.trades_for(buy).len(), 1);
    }

    #[tokio::test]
    async fn test_conservation_across_sells() {
        let ledger = ledger();
        let buy = ledger
            .submit_buy_intent(buy_spec(3 * SATS_PER_BTC, 15))
            .await
            .unwrap();
        let s1 = ledger
            .submit_sell_intent(sell_spec(SELLER, 6, SATS_PER_BTC))
            .await
            .unwrap();
        let s2 = ledger
            .submit_sell_intent(sell_spec(SELLER_2, 20, 2 * SATS_PER_BTC))
            .await
            .unwrap();

        let trades = ledger.match_intent(buy, EXECUTOR).await.unwrap();
        assert_eq!(trades.len(), 2);

        let matched_eth = trades
            .iter()
            .fold(U256::zero(), |acc, t| acc + t.eth_amount);
        let matched_btc: u64 = trades.iter().map(|t| t.btc_amount).sum();

        let consumed = [s1, s2]
            .iter()
            .map(|id| ledger.get_sell_intent(*id).unwrap().filled_eth)
            .fold(U256::zero(), |acc, e| acc + e);
        assert!(matched_eth <= consumed);
        assert!(matched_btc <= 3 * SATS_PER_BTC);

        let b = ledger.get_buy_intent(buy).unwrap();
        assert_eq!(b.received_eth, matched_eth);
        assert_eq!(b.filled_btc, matched_btc);
    }

    // =============================================================================
    // LOCK LIFECYCLE
    // =============================================================================

    /// Withdraw succeeds once, even past the timelock.
    #[tokio::test]
    async fn test_withdraw_settles_once_and_blocks_refund() {
        let h = htlc();
        let lock_id = eth_lock(&h).await;

        h.clock.set(NOW + 3_601);
        let settlement = h.coordinator.withdraw(lock_id, PREIMAGE).await.unwrap();
        assert_eq!(settlement.state, LockState::Withdrawn);
        assert_eq!(eth_balance(&h, BUYER).await, eth_to_wei(10));

        let again = h.coordinator.withdraw(lock_id, PREIMAGE).await;
        assert!(matches!(again, Err(HtlcError::AlreadyTerminal { .. })));
        let refund = h.coordinator.refund(lock_id).await;
        assert!(matches!(refund, Err(HtlcError::AlreadyTerminal { .. })));
    }

    /// Refund only after expiry, and only once.
    #[tokio::test]
    async fn test_refund_only_after_expiry_and_once() {
        let h = htlc();
        let lock_id = eth_lock(&h).await;

        h.clock.set(NOW + 10);
        let early = h.coordinator.refund(lock_id).await;
        assert!(matches!(early, Err(HtlcError::NotExpired { .. })));
        assert_eq!(
            h.coordinator.get_lock(lock_id).unwrap().state,
            LockState::Locked
        );

        h.clock.set(NOW + 3_601);
        let settlement = h.coordinator.refund(lock_id).await.unwrap();
        assert_eq!(settlement.state, LockState::Refunded);
        assert_eq!(eth_balance(&h, SELLER).await, eth_to_wei(10));

        let again = h.coordinator.refund(lock_id).await;
        assert!(matches!(again, Err(HtlcError::AlreadyTerminal { .. })));
        let withdraw = h.coordinator.withdraw(lock_id, PREIMAGE).await;
        assert!(matches!(withdraw, Err(HtlcError::AlreadyTerminal { .. })));
    }

    #[tokio::test]
    async fn test_wrong_preimage_leaves_lock_open() {
        let h = htlc();
        let lock_id = eth_lock(&h).await;

        let wrong = h.coordinator.withdraw(lock_id, b"not it").await;
        assert!(matches!(wrong, Err(HtlcError::HashMismatch { .. })));
        assert_eq!(
            h.coordinator.get_lock(lock_id).unwrap().state,
            LockState::Locked
        );

        h.coordinator.withdraw(lock_id, PREIMAGE).await.unwrap();
        let revealed = h.coordinator.revealed_preimage(lock_id).await.unwrap();
        assert_eq!(revealed.as_deref(), Some(PREIMAGE));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_withdraw_refund_race_settles_once() {
        let h = htlc();
        let lock_id = eth_lock(&h).await;
        h.clock.set(NOW + 3_601);

        let mut handles = Vec::new();
        for i in 0..8 {
            let coordinator = h.coordinator.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    coordinator.withdraw(lock_id, PREIMAGE).await
                } else {
                    coordinator.refund(lock_id).await
                }
            }));
        }

        let mut settled = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => settled += 1,
                Err(e) => assert!(matches!(e, HtlcError::AlreadyTerminal { .. })),
            }
        }
        assert_eq!(settled, 1);

        let total = eth_balance(&h, BUYER).await + eth_balance(&h, SELLER).await;
        assert_eq!(total, eth_to_wei(10));
    }
}
