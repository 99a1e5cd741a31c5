//! # Multisig Gate Races
//!
//! Concurrent confirmations and executions against the runtime's real call
//! targets: the payload must run exactly once.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Harness, BUYER, ETH_LOCKTIME};
    use sc_02_htlc::{HtlcApi, LockState};
    use sc_03_multisig::{MultisigApi, MultisigError};
    use shared_types::{eth_to_wei, ChainId, ErrorClass, HashLock};
    use std::sync::Arc;
    use swap_runtime::adapters::HtlcCall;
    use swap_runtime::container::contracts;

    const PREIMAGE: &[u8] = b"gated preimage";

    fn new_lock_payload() -> Vec<u8> {
        HtlcCall::NewLock {
            recipient: BUYER,
            hash_lock: HashLock::of(PREIMAGE),
            timelock: ETH_LOCKTIME,
        }
        .encode()
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_execute_runs_payload_once() {
        let h = Harness::new();
        h.fund_custody(10);
        let multisig = h.container.multisig.clone();
        let owners = multisig.owners();

        let tx_id = multisig
            .submit_transaction(owners[0], contracts::HTLC, eth_to_wei(4), new_lock_payload())
            .unwrap();
        multisig.confirm_transaction(tx_id, owners[0]).unwrap();
        multisig.confirm_transaction(tx_id, owners[1]).unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let multisig = Arc::clone(&multisig);
            let executor = owners[i % owners.len()];
            handles.push(tokio::spawn(async move {
                multisig.execute_transaction(tx_id, executor).await
            }));
        }

        let mut fired = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(receipt) => {
                    assert!(receipt.success, "{:?}", receipt.error);
                    fired += 1;
                }
                Err(e) => assert!(matches!(e, MultisigError::AlreadyExecuted(_))),
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(h.container.htlc.list_locks(Some(ChainId::Eth)).len(), 1);
        assert_eq!(
            h.container.htlc.balance(&h.custody()).await.unwrap(),
            eth_to_wei(6)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirms_use_set_semantics() {
        let h = Harness::new();
        let multisig = h.container.multisig.clone();
        let owners = multisig.owners();
        let tx_id = multisig
            .submit_transaction(owners[0], contracts::HTLC, eth_to_wei(1), new_lock_payload())
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..12 {
            let multisig = Arc::clone(&multisig);
            // Four attempts per owner.
            let signer = owners[i % owners.len()];
            handles.push(tokio::spawn(async move {
                multisig.confirm_transaction(tx_id, signer)
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert!(matches!(e, MultisigError::AlreadyConfirmed { .. })),
            }
        }
        assert_eq!(accepted, owners.len());
        assert_eq!(multisig.confirmation_count(tx_id).unwrap(), owners.len());
    }

    #[tokio::test]
    async fn test_failed_call_is_executed_and_reported() {
        let h = Harness::new();
        h.fund_custody(10);
        let multisig = h.container.multisig.clone();
        let owners = multisig.owners();

        let open = multisig
            .submit_transaction(owners[0], contracts::HTLC, eth_to_wei(2), new_lock_payload())
            .unwrap();
        multisig.confirm_transaction(open, owners[0]).unwrap();
        multisig.confirm_transaction(open, owners[1]).unwrap();
        multisig.execute_transaction(open, owners[0]).await.unwrap();
        let lock_id = h.container.htlc.list_locks(Some(ChainId::Eth))[0].lock_id;

        let bad = HtlcCall::Withdraw {
            lock_id,
            preimage: b"wrong".to_vec(),
        }
        .encode()
        .unwrap();
        let tx_id = multisig
            .submit_transaction(owners[1], contracts::HTLC, Default::default(), bad)
            .unwrap();
        multisig.confirm_transaction(tx_id, owners[1]).unwrap();
        multisig.confirm_transaction(tx_id, owners[2]).unwrap();

        let receipt = multisig.execute_transaction(tx_id, owners[2]).await.unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.error_class, Some(ErrorClass::HashMismatch));
        assert!(multisig.get_transaction(tx_id).unwrap().executed);
        assert_eq!(
            h.container.htlc.get_lock(lock_id).unwrap().state,
            LockState::Locked
        );

        let again = multisig.execute_transaction(tx_id, owners[0]).await;
        assert!(matches!(again, Err(MultisigError::AlreadyExecuted(_))));
    }

    #[tokio::test]
    async fn test_below_threshold_cannot_execute() {
        let h = Harness::new();
        let multisig = h.container.multisig.clone();
        let owners = multisig.owners();
        let tx_id = multisig
            .submit_transaction(owners[0], contracts::HTLC, eth_to_wei(1), new_lock_payload())
            .unwrap();
        multisig.confirm_transaction(tx_id, owners[0]).unwrap();

        let result = multisig.execute_transaction(tx_id, owners[0]).await;
        assert!(result.is_err());
        assert!(!multisig.get_transaction(tx_id).unwrap().executed);
        assert!(h.container.htlc.list_locks(None).is_empty());
    }
}
