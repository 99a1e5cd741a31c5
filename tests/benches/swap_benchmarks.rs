//! # Swap Coordinator Benchmarks
//!
//! | Subsystem | Operation |
//! |-----------|-----------|
//! | sc-01 Intent Matching | planning a buy intent against N sell intents |
//! | sc-02 HTLC | building the BTC HTLC script |
//! | sc-04 Secret Bridge | deriving per-trade hash locks |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use primitive_types::U256;
use sc_01_intent_matching::{offchain_id, plan_matches, BuyIntent, IntentStatus, SellIntent};
use sc_04_secret_bridge::{generate_base_secret, hash_lock_for, SecretPolicy};
use sc_tests::fixtures::{buyer_btc, seller_btc, BUYER, NOW, SELLER};
use shared_types::{eth_to_wei, SATS_PER_BTC};
use std::time::Duration;

// ============================================================================
// SC-01: Intent Matching
// ============================================================================

fn bench_plan_matches(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-01-plan-matches");
    group.measurement_time(Duration::from_secs(5));

    let buy = BuyIntent {
        id: 0,
        buyer: BUYER,
        sell_amount_btc: 1_000 * SATS_PER_BTC,
        min_buy_amount_eth: eth_to_wei(5_000),
        locktime: NOW + 3_600,
        offchain_id: offchain_id("bench-buy"),
        slippage_bps: 50,
        status: IntentStatus::Pending,
        filled_btc: 0,
        received_eth: U256::zero(),
        created_at: NOW,
    };

    for count in [10usize, 100, 1_000] {
        let sells: Vec<SellIntent> = (0..count)
            .map(|i| SellIntent {
                id: i as u64,
                seller: SELLER,
                sell_amount_eth: eth_to_wei(1 + (i as u64 % 7)),
                min_buy_amount_btc: SATS_PER_BTC / 10,
                deadline: NOW + 3_600,
                offchain_id: offchain_id("bench-sell"),
                status: IntentStatus::Pending,
                filled_eth: U256::zero(),
                received_btc: 0,
                created_at: NOW,
            })
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &sells, |b, sells| {
            b.iter(|| black_box(plan_matches(&buy, sells.iter(), NOW)))
        });
    }
    group.finish();
}

// ============================================================================
// SC-02: BTC HTLC script
// ============================================================================

fn bench_htlc_script(c: &mut Criterion) {
    let recipient = seller_btc();
    let sender = buyer_btc();
    let hash = [0x42u8; 32];

    c.bench_function("sc-02-build-htlc-script", |b| {
        b.iter(|| {
            black_box(sc_02_htlc::build_htlc_script(
                hash,
                &recipient,
                &sender,
                NOW + 7_200,
            ))
        })
    });
}

// ============================================================================
// SC-04: Hash lock derivation
// ============================================================================

fn bench_hash_locks(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc-04-hash-lock-for");
    let base = generate_base_secret();

    for policy in [SecretPolicy::SharedHash, SecretPolicy::PerTradeSalted] {
        group.bench_function(policy.to_string(), |b| {
            let mut index = 0u64;
            b.iter(|| {
                index = index.wrapping_add(1);
                black_box(hash_lock_for(&base, policy, index))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan_matches, bench_htlc_script, bench_hash_locks);

criterion_main!(benches);
