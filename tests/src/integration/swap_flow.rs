//! # Swap Flow
//!
//! A batch driven end to end the way the runtime drives it: matching, ETH
//! locks through the multisig, BTC legs, reveal and claim, refunds.

#[cfg(test)]
mod tests {
    use crate::fixtures::{buy_spec, buyer_btc, seller_btc, Harness, BUYER, ETH_LOCKTIME, MARGIN};
    use primitive_types::U256;
    use sc_01_intent_matching::{IntentApi, IntentError, IntentId, SellIntentSpec};
    use sc_02_htlc::{HtlcApi, LockState, Participant};
    use sc_03_multisig::MultisigApi;
    use sc_04_secret_bridge::{BridgeApi, BridgeError, HtlcRecord, SecretPolicy};
    use shared_types::{eth_to_wei, ChainId, Classify, ErrorClass, SATS_PER_BTC};
    use swap_runtime::handlers::{FlowError, TradeStatus};

    const BTC_LOCKTIME: u64 = ETH_LOCKTIME + MARGIN + 1;

    /// Two trades: 6 ETH for 1 BTC and 9 ETH for 0.9 BTC.
    async fn two_trade_batch(h: &Harness) -> IntentId {
        h.matched_batch(
            buy_spec(3 * SATS_PER_BTC, 15),
            &[(6, SATS_PER_BTC), (20, 2 * SATS_PER_BTC)],
        )
        .await
    }

    fn approvers(h: &Harness) -> Vec<[u8; 20]> {
        h.flow.default_approvers()
    }

    async fn balance(h: &Harness, who: Participant) -> U256 {
        h.container.htlc.balance(&who).await.unwrap()
    }

    #[tokio::test]
    async fn test_full_swap_salted_batch() {
        let h = Harness::new();
        h.fund_custody(20);
        h.fund_buyer_btc(3);
        let buy_id = two_trade_batch(&h).await;
        let approvers = approvers(&h);

        let report = h
            .flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await
            .unwrap();
        assert_eq!(report.locked(), 2);
        assert!(!report.liquidity_shortfall);
        assert_eq!(report.required_eth, eth_to_wei(15));

        let doc = h.container.bridge.document(buy_id).unwrap();
        assert_ne!(doc.htlcs[0].secret_hash_sha256, doc.htlcs[1].secret_hash_sha256);

        // Every trade is associated with its lock on the ledger.
        for trade in h.container.intents.trades_for(buy_id) {
            assert!(h.container.intents.lock_for(trade.trade_id).is_some());
        }

        let mut btc_total = 0;
        for record in &doc.htlcs {
            let btc_lock = h
                .flow
                .open_btc_leg(
                    buy_id,
                    record.trade_index,
                    buyer_btc(),
                    seller_btc(),
                    BTC_LOCKTIME,
                )
                .await
                .unwrap();
            assert_eq!(btc_lock.amount, U256::from(record.btc_amount));
            btc_total += record.btc_amount;

            let (_, eth_settlement) = h
                .flow
                .withdraw_eth(buy_id, record.trade_index, &approvers)
                .await
                .unwrap();
            assert_eq!(eth_settlement.state, LockState::Withdrawn);

            let btc_settlement = h.flow.claim_btc(buy_id, record.trade_index).await.unwrap();
            assert_eq!(btc_settlement.state, LockState::Withdrawn);
        }

        assert_eq!(balance(&h, Participant::Eth(BUYER)).await, eth_to_wei(15));
        assert_eq!(balance(&h, h.custody()).await, eth_to_wei(5));
        assert_eq!(
            balance(&h, Participant::Btc(seller_btc())).await,
            U256::from(btc_total)
        );
        assert_eq!(
            balance(&h, Participant::Btc(buyer_btc())).await,
            U256::from(3 * SATS_PER_BTC - btc_total)
        );
        assert!(h.container.bridge.verify_document(buy_id).is_ok());
    }

    #[tokio::test]
    async fn test_shared_hash_batch_reuses_one_lock_hash() {
        let h = Harness::new();
        h.fund_custody(20);
        let buy_id = two_trade_batch(&h).await;
        let approvers = approvers(&h);

        h.flow
            .open_batch(buy_id, SecretPolicy::SharedHash, &approvers)
            .await
            .unwrap();

        let doc = h.container.bridge.document(buy_id).unwrap();
        assert_eq!(doc.htlcs.len(), 2);
        assert_eq!(doc.htlcs[0].hash_lock(), doc.htlcs[1].hash_lock());
        assert_eq!(doc.htlcs[0].secret_hash_sha256, doc.base_sha256);
    }

    #[tokio::test]
    async fn test_liquidity_shortfall_is_best_effort() {
        let h = Harness::new();
        h.fund_custody(8);
        let buy_id = two_trade_batch(&h).await;
        let approvers = approvers(&h);

        let report = h
            .flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await
            .unwrap();
        assert!(report.liquidity_shortfall);
        assert_eq!(report.available_eth, eth_to_wei(8));
        assert_eq!(report.locked(), 1);
        assert_eq!(report.failed(), 1);
        let failed = report
            .trades
            .iter()
            .find(|t| t.status == TradeStatus::Failed)
            .unwrap();
        assert_eq!(failed.error_class, Some(ErrorClass::LiquidityShortfall));

        // Top up and re-run: the open trade is not locked twice.
        h.fund_custody(10);
        let rerun = h
            .flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await
            .unwrap();
        assert!(!rerun.liquidity_shortfall);
        assert_eq!(rerun.locked(), 2);
        assert_eq!(
            rerun
                .trades
                .iter()
                .filter(|t| t.status == TradeStatus::AlreadyOpen)
                .count(),
            1
        );
        assert_eq!(h.container.htlc.list_locks(Some(ChainId::Eth)).len(), 2);
        assert_eq!(balance(&h, h.custody()).await, eth_to_wei(3));
    }

    #[tokio::test]
    async fn test_reveal_waits_for_btc_leg() {
        let h = Harness::new();
        h.fund_custody(20);
        let buy_id = two_trade_batch(&h).await;
        let approvers = approvers(&h);
        h.flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await
            .unwrap();

        let early = h.flow.withdraw_eth(buy_id, 0, &approvers).await;
        assert!(matches!(
            early,
            Err(FlowError::Bridge(BridgeError::CounterpartNotEscrowed { .. }))
        ));
        assert!(h
            .container
            .htlc
            .list_locks(Some(ChainId::Eth))
            .iter()
            .all(|l| l.state == LockState::Locked));

        let claim = h.flow.claim_btc(buy_id, 0).await;
        assert!(matches!(claim, Err(FlowError::BtcLegMissing { .. })));
    }

    #[tokio::test]
    async fn test_btc_leg_rejects_early_timelock() {
        let h = Harness::new();
        h.fund_custody(20);
        h.fund_buyer_btc(3);
        let buy_id = two_trade_batch(&h).await;
        let approvers = approvers(&h);
        h.flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await
            .unwrap();

        let result = h
            .flow
            .open_btc_leg(buy_id, 0, buyer_btc(), seller_btc(), ETH_LOCKTIME + MARGIN)
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation);
        assert!(h.container.htlc.list_locks(Some(ChainId::Btc)).is_empty());
    }

    #[tokio::test]
    async fn test_refund_both_legs_after_expiry() {
        let h = Harness::new();
        h.fund_custody(20);
        h.fund_buyer_btc(3);
        let buy_id = two_trade_batch(&h).await;
        let approvers = approvers(&h);
        h.flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await
            .unwrap();
        h.flow
            .open_btc_leg(buy_id, 0, buyer_btc(), seller_btc(), BTC_LOCKTIME)
            .await
            .unwrap();

        let early = h.flow.refund_eth(buy_id, 0, &approvers).await.unwrap_err();
        assert_eq!(early.class(), ErrorClass::StateConflict);

        h.clock.set(BTC_LOCKTIME);
        let (_, eth) = h.flow.refund_eth(buy_id, 0, &approvers).await.unwrap();
        assert_eq!(eth.state, LockState::Refunded);
        let btc = h.flow.refund_btc(buy_id, 0).await.unwrap();
        assert_eq!(btc.state, LockState::Refunded);

        // Trade 1 is still locked; custody got trade 0 back.
        let locked: U256 = h
            .container
            .htlc
            .list_locks(Some(ChainId::Eth))
            .iter()
            .filter(|l| l.state == LockState::Locked)
            .fold(U256::zero(), |acc, l| acc + l.amount);
        assert_eq!(balance(&h, h.custody()).await + locked, eth_to_wei(20));
        assert_eq!(
            balance(&h, Participant::Btc(buyer_btc())).await,
            U256::from(3 * SATS_PER_BTC)
        );

        let late = h.flow.withdraw_eth(buy_id, 0, &approvers).await;
        assert!(late.is_err());
    }

    #[tokio::test]
    async fn test_open_batch_without_trades() {
        let h = Harness::new();
        let buy_id = h
            .container
            .intents
            .submit_buy_intent(buy_spec(SATS_PER_BTC, 5))
            .await
            .unwrap();
        let approvers = approvers(&h);

        let result = h
            .flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
            .await;
        assert!(matches!(result, Err(FlowError::NoTrades(_))));
    }

    #[tokio::test]
    async fn test_record_for_unknown_lock_is_not_reported_open() {
        let h = Harness::new();
        h.fund_custody(20);
        let buy_id = h
            .matched_batch(buy_spec(2 * SATS_PER_BTC, 10), &[(20, 9 * SATS_PER_BTC)])
            .await;
        let trade = h.container.intents.trades_for(buy_id)[0].clone();

        // A record left behind for this slot whose lock the coordinator never saw.
        let bridge = &h.container.bridge;
        bridge.seed_batch(buy_id, SecretPolicy::PerTradeSalted).unwrap();
        let hash_lock = bridge.hash_lock_for(buy_id, 0).unwrap();
        bridge
            .record_lock(
                buy_id,
                HtlcRecord {
                    trade_index: 0,
                    trade_id: trade.trade_id,
                    sell_intent_id: trade.sell_intent_id,
                    lock_id: [0x99; 32],
                    btc_lock_id: None,
                    locktime: ETH_LOCKTIME,
                    secret_hash_keccak: hash_lock.keccak256,
                    secret_hash_sha256: hash_lock.sha256,
                    eth_amount: trade.eth_amount,
                    btc_amount: trade.btc_amount,
                    recipient: BUYER,
                },
            )
            .unwrap();

        let report = h
            .flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers(&h))
            .await
            .unwrap();
        assert_eq!(report.locked(), 0);
        assert_eq!(report.trades[0].status, TradeStatus::Failed);
        assert_eq!(report.trades[0].error_class, Some(ErrorClass::StateConflict));
        assert!(report.trades[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("stale lock record"));

        assert_eq!(h.container.intents.lock_for(trade.trade_id), None);
        assert!(h.container.htlc.list_locks(Some(ChainId::Eth)).is_empty());
        assert_eq!(balance(&h, h.custody()).await, eth_to_wei(20));
    }

    #[tokio::test]
    async fn test_sell_from_non_market_maker_rejected() {
        let h = Harness::new();
        let err = h
            .container
            .intents
            .submit_sell_intent(SellIntentSpec {
                seller: [0x02; 20],
                sell_amount_eth: eth_to_wei(20),
                min_buy_amount_btc: 9 * SATS_PER_BTC,
                deadline: ETH_LOCKTIME,
                offchain_label: "sell-eth".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, IntentError::NotMarketMaker([0x02; 20]));
        assert_eq!(err.class(), ErrorClass::Validation);

        let id = h.offer_sell(20, 9 * SATS_PER_BTC).await;
        let sell = h.container.intents.get_sell_intent(id).unwrap();
        assert_eq!(sell.seller, h.container.multisig.address());
    }
}
