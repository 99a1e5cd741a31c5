//! # Interchange Log Across Restarts
//!
//! The hash pair of a batch is reproducible from the file-backed log by a
//! freshly wired runtime.

#[cfg(test)]
mod tests {
    use crate::fixtures::{buy_spec, Harness, MARGIN};
    use sc_02_htlc::HtlcApi;
    use sc_04_secret_bridge::{BridgeApi, BridgeError, SecretPolicy};
    use shared_types::{ChainId, ErrorClass, SATS_PER_BTC};
    use swap_runtime::handlers::TradeStatus;
    use std::path::Path;
    use swap_runtime::RuntimeConfig;

    fn harness_at(path: &Path) -> Harness {
        let mut config = RuntimeConfig::default();
        config.htlc.timelock_margin_secs = MARGIN;
        config.interchange_path = Some(path.to_path_buf());
        Harness::with_config(config)
    }

    #[tokio::test]
    async fn test_document_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("interchange.jsonl");

        let (buy_id, before, lock_hash) = {
            let h = harness_at(&path);
            h.fund_custody(20);
            let buy_id = h
                .matched_batch(
                    buy_spec(2 * SATS_PER_BTC, 10),
                    &[(20, 9 * SATS_PER_BTC)],
                )
                .await;
            let approvers = h.flow.default_approvers();
            let report = h
                .flow
                .open_batch(buy_id, SecretPolicy::PerTradeSalted, &approvers)
                .await
                .unwrap();
            assert_eq!(report.locked(), 1);

            let doc = h.container.bridge.document(buy_id).unwrap();
            let lock_hash = h.container.bridge.hash_lock_for(buy_id, 0).unwrap();
            (buy_id, doc, lock_hash)
        };

        let h = harness_at(&path);
        let after = h.container.bridge.document(buy_id).unwrap();
        assert_eq!(after.base_keccak, before.base_keccak);
        assert_eq!(after.base_sha256, before.base_sha256);
        assert_eq!(after.htlcs, before.htlcs);
        assert_eq!(
            h.container.bridge.hash_lock_for(buy_id, 0).unwrap(),
            lock_hash
        );
        assert!(h.container.bridge.verify_document(buy_id).is_ok());

        // Re-seeding after restart reuses the persisted secret.
        let reseeded = h
            .container
            .bridge
            .seed_batch(buy_id, SecretPolicy::PerTradeSalted)
            .unwrap();
        assert_eq!(reseeded.base_sha256, before.base_sha256);
    }

    #[tokio::test]
    async fn test_policy_cannot_change_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interchange.jsonl");

        {
            let h = harness_at(&path);
            h.container
                .bridge
                .seed_batch(7, SecretPolicy::SharedHash)
                .unwrap();
        }

        let h = harness_at(&path);
        let err = h
            .container
            .bridge
            .seed_batch(7, SecretPolicy::PerTradeSalted)
            .unwrap_err();
        assert!(matches!(err, BridgeError::PolicyMismatch { .. }));
        assert_eq!(
            shared_types::Classify::class(&err),
            ErrorClass::StateConflict
        );
    }

    #[tokio::test]
    async fn test_new_batch_after_restart_does_not_inherit_old_locks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interchange.jsonl");

        let (first_id, first_lock) = {
            let h = harness_at(&path);
            h.fund_custody(20);
            let buy_id = h
                .matched_batch(buy_spec(2 * SATS_PER_BTC, 10), &[(20, 9 * SATS_PER_BTC)])
                .await;
            let report = h
                .flow
                .open_batch(buy_id, SecretPolicy::PerTradeSalted, &h.flow.default_approvers())
                .await
                .unwrap();
            (buy_id, report.trades[0].lock_id.unwrap())
        };

        // Ledger and chains start empty; only the interchange log survives.
        let h = harness_at(&path);
        h.fund_custody(20);
        let buy_id = h
            .matched_batch(buy_spec(2 * SATS_PER_BTC, 10), &[(20, 9 * SATS_PER_BTC)])
            .await;
        assert_ne!(buy_id, first_id);

        let report = h
            .flow
            .open_batch(buy_id, SecretPolicy::PerTradeSalted, &h.flow.default_approvers())
            .await
            .unwrap();
        assert_eq!(report.trades[0].status, TradeStatus::Opened);
        let lock_id = report.trades[0].lock_id.unwrap();
        assert_ne!(lock_id, first_lock);
        assert!(h.container.htlc.get_lock(lock_id).is_some());
        assert_eq!(h.container.htlc.list_locks(Some(ChainId::Eth)).len(), 1);

        assert_eq!(
            h.container.bridge.list_batches().unwrap(),
            vec![first_id, buy_id]
        );
        assert_eq!(
            h.container.bridge.document(first_id).unwrap().htlcs[0].lock_id,
            first_lock
        );
    }
}
