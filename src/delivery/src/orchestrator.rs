//! Delivery orchestrator
//!
//! A round runs evolve -> enforce -> score -> select -> seal. The metrics
//! table is owned here; the registry, KEM and reputation functions are
//! read-only collaborators.

use crate::error::{DeliveryError, Result};
use crate::metrics::DeliveryMetrics;
use crate::registry::NodeRegistry;
use crate::selection::SelectionPolicy;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use relaygate_core::{NodeId, ReputationScore};
use relaygate_crypto::{decrypt_with, encrypt_for, Envelope, KeyEncapsulation};
use relaygate_reputation::{
    partition, record_fault, record_forced_healthy, record_round, score_all,
    update_node_reputation_score, update_reputation_metrics, MetricsTable, NodeMetrics,
    ReputationConfig, ReputationMetrics, ReputationStatistics,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// State of the network after one round's evolve + enforce + score steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    /// 1-based round counter
    pub round: u64,
    pub round_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub metrics: BTreeMap<NodeId, NodeMetrics>,
    pub scores: BTreeMap<NodeId, ReputationScore>,
    /// Safe ids in id order
    pub safe: Vec<NodeId>,
    pub unsafe_nodes: Vec<NodeId>,
    pub faulted: Vec<NodeId>,
    pub forced: Vec<NodeId>,
    pub statistics: ReputationStatistics,
}

/// A sealed payload addressed to one recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub round: u64,
    pub round_id: Uuid,
    pub recipient: NodeId,
    pub envelope: Envelope,
}

impl Delivery {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DeliveryError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DeliveryError::Serialization(e.to_string()))
    }
}

/// Result of [`DeliveryOrchestrator::run_round`]
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub report: RoundReport,
    /// `None` when no node was eligible
    pub delivery: Option<Delivery>,
}

impl RoundOutcome {
    pub fn is_delivered(&self) -> bool {
        self.delivery.is_some()
    }

    /// The delivery, or [`DeliveryError::NoEligibleRecipient`]
    pub fn into_delivery(self) -> Result<Delivery> {
        self.delivery.ok_or(DeliveryError::NoEligibleRecipient)
    }
}

pub struct DeliveryOrchestrator {
    table: MetricsTable,
    registry: Arc<NodeRegistry>,
    kem: Arc<dyn KeyEncapsulation>,
    config: ReputationConfig,
    policy: SelectionPolicy,
    rng: Mutex<StdRng>,
    round: AtomicU64,
    reputation_metrics: Option<Arc<ReputationMetrics>>,
    delivery_metrics: Option<Arc<DeliveryMetrics>>,
}

impl DeliveryOrchestrator {
    /// Create an orchestrator with bootstrap metrics for every registered node
    pub fn new(
        registry: Arc<NodeRegistry>,
        kem: Arc<dyn KeyEncapsulation>,
        config: ReputationConfig,
        policy: SelectionPolicy,
    ) -> Result<Self> {
        Self::with_rng(registry, kem, config, policy, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a caller-supplied generator
    pub fn with_rng(
        registry: Arc<NodeRegistry>,
        kem: Arc<dyn KeyEncapsulation>,
        config: ReputationConfig,
        policy: SelectionPolicy,
        mut rng: StdRng,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DeliveryError::configuration(e.to_string()))?;
        if registry.is_empty() {
            return Err(DeliveryError::configuration("node registry is empty"));
        }

        let table = MetricsTable::bootstrap(registry.node_ids(), &mut rng);
        info!(
            nodes = table.len(),
            algorithm = %kem.algorithm(),
            policy = %policy,
            threshold = config.safe_threshold,
            "Delivery orchestrator ready"
        );

        Ok(Self {
            table,
            registry,
            kem,
            config,
            policy,
            rng: Mutex::new(rng),
            round: AtomicU64::new(0),
            reputation_metrics: None,
            delivery_metrics: None,
        })
    }

    pub fn with_reputation_metrics(mut self, metrics: Arc<ReputationMetrics>) -> Self {
        self.reputation_metrics = Some(metrics);
        self
    }

    pub fn with_delivery_metrics(mut self, metrics: Arc<DeliveryMetrics>) -> Self {
        self.delivery_metrics = Some(metrics);
        self
    }

    /// Evolve, enforce and score without delivering
    pub fn advance_round(&self) -> RoundReport {
        let started_at = Utc::now();

        // Numbering and snapshot share the critical section of the mutation
        let (round, mut advance) = {
            let mut rng = self.rng.lock();
            let round = self.round.fetch_add(1, Ordering::SeqCst) + 1;
            (round, self.table.advance(&self.config, &mut *rng))
        };

        let metrics = std::mem::take(&mut advance.metrics);
        let scores = score_all(&metrics);
        let (safe, unsafe_nodes) = partition(&scores, self.config.safe_threshold);
        let total_missed = metrics.values().map(|m| m.missed).sum();
        let statistics =
            ReputationStatistics::from_scores(&scores, self.config.safe_threshold, total_missed);

        for (node_id, score) in &scores {
            debug!(
                round,
                node_id = %node_id,
                score,
                safe = safe.contains(node_id),
                "Scored node"
            );
        }

        if let Some(m) = &self.reputation_metrics {
            for (node_id, score) in &scores {
                update_node_reputation_score(m, node_id.as_str(), *score);
            }
            for node_id in &advance.faulted {
                record_fault(m, node_id.as_str());
            }
            for node_id in &advance.forced {
                record_forced_healthy(m, node_id.as_str());
            }
            update_reputation_metrics(m, &statistics);
            record_round(m);
        }

        RoundReport {
            round,
            round_id: Uuid::new_v4(),
            started_at,
            metrics,
            scores,
            safe,
            unsafe_nodes,
            faulted: advance.faulted,
            forced: advance.forced,
            statistics,
        }
    }

    /// Run a full round and seal `payload` for one eligible node
    pub fn run_round(&self, payload: &[u8]) -> Result<RoundOutcome> {
        let report = self.advance_round();

        let chosen = {
            let mut rng = self.rng.lock();
            self.policy.select(
                &report.safe,
                &self.registry.node_ids(),
                &report.scores,
                &mut *rng,
            )
        };

        let recipient = match chosen {
            Some(recipient) => recipient,
            None => {
                warn!(
                    round = report.round,
                    nodes = report.scores.len(),
                    threshold = self.config.safe_threshold,
                    error = %DeliveryError::NoEligibleRecipient,
                    "Skipping delivery"
                );
                if let Some(m) = &self.delivery_metrics {
                    m.record_skipped();
                }
                return Ok(RoundOutcome {
                    report,
                    delivery: None,
                });
            }
        };

        let envelope = self.seal_for(&recipient, payload)?;
        let delivery = Delivery {
            round: report.round,
            round_id: report.round_id,
            recipient,
            envelope,
        };

        info!(
            round = delivery.round,
            recipient = %delivery.recipient,
            score = report.scores.get(&delivery.recipient).copied().unwrap_or(0),
            envelope_bytes = delivery.envelope.size(),
            "Sealed payload for recipient"
        );
        if let Some(m) = &self.delivery_metrics {
            m.record_delivery(self.policy.as_str(), delivery.envelope.size());
        }

        Ok(RoundOutcome {
            report,
            delivery: Some(delivery),
        })
    }

    /// Open a delivery with the recipient's registered secret key
    pub fn verify_delivery(&self, delivery: &Delivery) -> Result<Vec<u8>> {
        let result = self.open_delivery(delivery);
        self.observe_verification(delivery, result)
    }

    /// Open a delivery and check the plaintext against the payload the
    /// caller sealed
    pub fn verify_payload(&self, delivery: &Delivery, expected: &[u8]) -> Result<()> {
        let result = self.open_delivery(delivery).and_then(|plaintext| {
            if plaintext == expected {
                Ok(())
            } else {
                Err(DeliveryError::PayloadMismatch(delivery.recipient.clone()))
            }
        });
        self.observe_verification(delivery, result)
    }

    fn observe_verification<T>(&self, delivery: &Delivery, result: Result<T>) -> Result<T> {
        if let Some(m) = &self.delivery_metrics {
            m.record_verification(result.is_ok());
        }
        match &result {
            Ok(_) => debug!(recipient = %delivery.recipient, "Delivery verified"),
            Err(e) => warn!(recipient = %delivery.recipient, error = %e, "Delivery verification failed"),
        }
        result
    }

    fn open_delivery(&self, delivery: &Delivery) -> Result<Vec<u8>> {
        let secret_key = self.registry.secret_key(&delivery.recipient).ok_or_else(|| {
            DeliveryError::configuration(format!(
                "registry holds no secret key for {}",
                delivery.recipient
            ))
        })?;

        Ok(decrypt_with(self.kem.as_ref(), secret_key, &delivery.envelope)?)
    }

    fn seal_for(&self, recipient: &NodeId, payload: &[u8]) -> Result<Envelope> {
        let public_key = self.registry.public_key(recipient)?;
        encrypt_for(self.kem.as_ref(), public_key, payload).map_err(|e| {
            if e.is_key_material() {
                DeliveryError::configuration(format!("public key for {}: {}", recipient, e))
            } else {
                DeliveryError::Crypto(e)
            }
        })
    }

    /// Rounds run so far
    pub fn rounds(&self) -> u64 {
        self.round.load(Ordering::SeqCst)
    }

    pub fn metrics_snapshot(&self) -> BTreeMap<NodeId, NodeMetrics> {
        self.table.snapshot()
    }

    pub fn scores(&self) -> BTreeMap<NodeId, ReputationScore> {
        self.table.scores()
    }

    pub fn table(&self) -> &MetricsTable {
        &self.table
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ReputationConfig {
        &self.config
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn kem(&self) -> &dyn KeyEncapsulation {
        self.kem.as_ref()
    }
}
