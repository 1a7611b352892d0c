//! Round Throughput Benchmarks
//!
//! Measures full delivery rounds (evolve, enforce, score, select, seal) and
//! score publishing against the in-memory ledger as the network grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use relaygate_crypto::{kem_for, KemAlgorithm};
use relaygate_delivery::{
    publish_scores, DeliveryOrchestrator, InMemoryScoreStore, NodeRegistry, SelectionPolicy,
};
use relaygate_reputation::ReputationConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Create an orchestrator over a freshly generated registry
fn create_orchestrator(algorithm: KemAlgorithm, nodes: usize) -> DeliveryOrchestrator {
    let kem = kem_for(algorithm);
    let mut rng = StdRng::seed_from_u64(42);
    let registry = NodeRegistry::generate(kem.as_ref(), nodes, &mut rng)
        .expect("Failed to generate registry");

    DeliveryOrchestrator::with_rng(
        Arc::new(registry),
        kem,
        ReputationConfig::default(),
        SelectionPolicy::UniformRandom,
        rng,
    )
    .expect("Failed to create orchestrator")
}

/// Benchmark a scoring-only round
fn bench_advance_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_round");

    for nodes in [8, 64, 512] {
        let orchestrator = create_orchestrator(KemAlgorithm::HashChain, nodes);
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| black_box(orchestrator.advance_round()));
        });
    }

    group.finish();
}

/// Benchmark a full delivery round for each KEM
fn bench_run_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_round");
    let payload = vec![0x5au8; 4096];

    for algorithm in [KemAlgorithm::HashChain, KemAlgorithm::MlKem768] {
        let orchestrator = create_orchestrator(algorithm, 32);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(algorithm), |b| {
            b.iter(|| black_box(orchestrator.run_round(&payload).expect("Round failed")));
        });
    }

    group.finish();
}

/// Benchmark publishing one round of scores
fn bench_publish_scores(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_scores");
    let rt = Runtime::new().expect("Failed to create runtime");

    for nodes in [8, 64, 512] {
        let orchestrator = create_orchestrator(KemAlgorithm::HashChain, nodes);
        let scores = orchestrator.advance_round().scores;
        let store = InMemoryScoreStore::new(orchestrator.config().safe_threshold);

        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.to_async(&rt).iter(|| async {
                black_box(publish_scores(&store, &scores, Duration::from_millis(500)).await)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_advance_round, bench_run_round, bench_publish_scores);
criterion_main!(benches);
