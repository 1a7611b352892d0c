//! End-to-end delivery pipeline
//!
//! Registry generation, on-disk round trip, repeated rounds, score
//! publishing and recipient-side opening, for both KEM constructions.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use relaygate_core::{CoreError, NodeId, ReputationScore, ScoreStore};
use relaygate_crypto::{decrypt_with, kem_for, CryptoError, Envelope, KemAlgorithm};
use relaygate_delivery::{
    publish_scores, DeliveryError, DeliveryOrchestrator, InMemoryScoreStore, NodeRegistry,
    SelectionPolicy,
};
use relaygate_reputation::ReputationConfig;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Generate, save and reload a registry, then build an orchestrator on it
fn pipeline(
    dir: &TempDir,
    algorithm: KemAlgorithm,
    nodes: usize,
    policy: SelectionPolicy,
    seed: u64,
) -> DeliveryOrchestrator {
    let kem = kem_for(algorithm);
    let mut rng = StdRng::seed_from_u64(seed);
    let path = dir.path().join("nodes.json");

    NodeRegistry::generate(kem.as_ref(), nodes, &mut rng)
        .expect("Failed to generate registry")
        .save(&path)
        .expect("Failed to save registry");

    let registry = NodeRegistry::load(&path).expect("Failed to load registry");
    registry.validate(kem.as_ref()).expect("Registry keys invalid");

    DeliveryOrchestrator::with_rng(
        Arc::new(registry),
        kem,
        ReputationConfig::default(),
        policy,
        rng,
    )
    .expect("Failed to build orchestrator")
}

async fn assert_rounds_deliver(orchestrator: &DeliveryOrchestrator, rounds: u64) {
    let store = InMemoryScoreStore::new(orchestrator.config().safe_threshold);

    for i in 0..rounds {
        let payload = format!("artifact #{}", i).into_bytes();
        let outcome = orchestrator.run_round(&payload).expect("Round failed");
        let report = &outcome.report;

        // Liveness: the healthy set keeps at least two nodes eligible
        assert!(report.safe.len() >= 2, "round {} had {} safe", report.round, report.safe.len());

        let summary = publish_scores(&store, &report.scores, Duration::from_millis(500)).await;
        assert!(summary.is_complete());

        let delivery = outcome.into_delivery().expect("Expected a delivery");
        assert!(store.is_safe(&delivery.recipient).await.unwrap());
        assert_eq!(orchestrator.verify_delivery(&delivery).unwrap(), payload);
    }

    assert_eq!(orchestrator.rounds(), rounds);
}

#[tokio::test]
async fn test_hash_chain_pipeline() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::HashChain, 8, SelectionPolicy::UniformRandom, 7);
    assert_rounds_deliver(&orchestrator, 25).await;
}

#[tokio::test]
async fn test_ml_kem_pipeline() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::MlKem768, 6, SelectionPolicy::FirstSafe, 8);
    assert_rounds_deliver(&orchestrator, 10).await;
}

#[tokio::test]
async fn test_single_node_network_stays_live() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::HashChain, 1, SelectionPolicy::HighestScore, 9);

    for _ in 0..20 {
        let outcome = orchestrator.run_round(b"solo").unwrap();
        assert_eq!(outcome.report.safe.len(), 1);
        assert!(outcome.is_delivered());
    }
}

#[test]
fn test_only_recipient_can_open() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::MlKem768, 4, SelectionPolicy::UniformRandom, 10);
    let kem = orchestrator.kem();

    let delivery = orchestrator.run_round(b"sealed").unwrap().into_delivery().unwrap();
    let registry = orchestrator.registry();

    for node_id in registry.node_ids() {
        let secret_key = registry.secret_key(&node_id).unwrap();
        let opened = decrypt_with(kem, secret_key, &delivery.envelope);
        if node_id == delivery.recipient {
            assert_eq!(opened.unwrap(), b"sealed".to_vec());
        } else {
            assert!(matches!(opened, Err(CryptoError::InvalidCiphertext)));
        }
    }
}

#[test]
fn test_tampered_envelope_is_rejected() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::HashChain, 4, SelectionPolicy::UniformRandom, 11);
    let mut delivery = orchestrator.run_round(b"integrity").unwrap().into_delivery().unwrap();

    let envelope = &delivery.envelope;
    let mut ciphertext = envelope.ciphertext().to_vec();
    ciphertext[0] ^= 0x01;
    delivery.envelope = Envelope::from_parts(
        *envelope.iv(),
        *envelope.tag(),
        ciphertext,
        envelope.kem_ciphertext().into_bytes(),
    );

    assert!(matches!(
        orchestrator.verify_delivery(&delivery),
        Err(DeliveryError::Crypto(CryptoError::AuthenticationFailure))
    ));
}

#[test]
fn test_delivery_survives_json_transport() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::MlKem768, 3, SelectionPolicy::HighestScore, 12);
    let delivery = orchestrator.run_round(b"over the wire").unwrap().into_delivery().unwrap();

    let received = relaygate_delivery::Delivery::from_json(&delivery.to_json().unwrap()).unwrap();
    assert_eq!(received.recipient, delivery.recipient);
    assert_eq!(
        orchestrator.verify_delivery(&received).unwrap(),
        b"over the wire".to_vec()
    );
}

/// Ledger that rejects one node and never answers for another
struct PartialLedger {
    inner: InMemoryScoreStore,
    rejected: NodeId,
    stalled: NodeId,
}

#[async_trait]
impl ScoreStore for PartialLedger {
    async fn update_score(&self, node_id: &NodeId, score: ReputationScore) -> relaygate_core::Result<()> {
        if node_id == &self.rejected {
            return Err(CoreError::store("ledger rejected write"));
        }
        if node_id == &self.stalled {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.update_score(node_id, score).await
    }

    async fn get_score(&self, node_id: &NodeId) -> relaygate_core::Result<ReputationScore> {
        self.inner.get_score(node_id).await
    }

    async fn is_safe(&self, node_id: &NodeId) -> relaygate_core::Result<bool> {
        self.inner.is_safe(node_id).await
    }
}

#[tokio::test]
async fn test_store_failures_do_not_stop_rounds() {
    let dir = TempDir::new().unwrap();
    let orchestrator = pipeline(&dir, KemAlgorithm::HashChain, 5, SelectionPolicy::UniformRandom, 13);
    let ids = orchestrator.registry().node_ids();

    let ledger = PartialLedger {
        inner: InMemoryScoreStore::new(orchestrator.config().safe_threshold),
        rejected: ids[0].clone(),
        stalled: ids[1].clone(),
    };

    for _ in 0..3 {
        let outcome = orchestrator.run_round(b"keep going").unwrap();
        let summary =
            publish_scores(&ledger, &outcome.report.scores, Duration::from_millis(100)).await;

        assert_eq!(summary.failed, vec![ids[0].clone()]);
        assert_eq!(summary.timed_out, vec![ids[1].clone()]);
        assert_eq!(summary.updated, 3);
        assert!(outcome.is_delivered());
    }

    assert_eq!(orchestrator.rounds(), 3);
    assert_eq!(ledger.inner.len(), 3);
    assert_eq!(ledger.get_score(&ids[0]).await.unwrap(), 0);
}
