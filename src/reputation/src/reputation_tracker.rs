//! Metrics table
//!
//! Owns the health record of every registered node. A round takes the write
//! lock once for evolve + enforce, so no node ever sees two mutations in
//! flight; scoring works on cloned snapshots.

use crate::evolution::evolve;
use crate::health::enforce_minimum_healthy;
use crate::score::{is_safe, score};
use crate::types::{NodeId, NodeMetrics, ReputationConfig, ReputationScore};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What one call to [`MetricsTable::advance`] changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundAdvance {
    /// Nodes that hit a fault event this round
    pub faulted: Vec<NodeId>,

    /// Nodes forced into the healthy band, in rank order
    pub forced: Vec<NodeId>,

    /// Table state right after this round, taken under the same write lock
    pub metrics: BTreeMap<NodeId, NodeMetrics>,
}

/// Node id to health record, unique keys, iterated in id order
#[derive(Debug, Default)]
pub struct MetricsTable {
    nodes: RwLock<BTreeMap<NodeId, NodeMetrics>>,
}

impl MetricsTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with bootstrap metrics for every id
    pub fn bootstrap<R, I>(node_ids: I, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = NodeId>,
    {
        let nodes = node_ids
            .into_iter()
            .map(|id| (id, NodeMetrics::bootstrap(rng)))
            .collect();
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Insert or replace a node's record
    pub fn insert(&self, node_id: NodeId, metrics: NodeMetrics) -> Option<NodeMetrics> {
        self.nodes.write().insert(node_id, metrics)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<NodeMetrics> {
        self.nodes.read().get(node_id).copied()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.read().contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Registered ids in ascending order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.read().keys().cloned().collect()
    }

    /// Consistent copy of every record
    pub fn snapshot(&self) -> BTreeMap<NodeId, NodeMetrics> {
        self.nodes.read().clone()
    }

    /// Current score of every node
    pub fn scores(&self) -> BTreeMap<NodeId, ReputationScore> {
        score_all(&self.snapshot())
    }

    /// Evolve every node, then force the minimum healthy set.
    ///
    /// The returned snapshot is this round's state even when other rounds
    /// run concurrently.
    pub fn advance<R: Rng + ?Sized>(&self, config: &ReputationConfig, rng: &mut R) -> RoundAdvance {
        let mut nodes = self.nodes.write();
        let mut outcome = RoundAdvance::default();

        for (node_id, metrics) in nodes.iter_mut() {
            let next = evolve(metrics, &config.evolution, rng);
            if next.missed > metrics.missed {
                debug!(node_id = %node_id, accuracy = next.accuracy, "Fault event");
                outcome.faulted.push(node_id.clone());
            }
            *metrics = next;
        }

        let ids: Vec<NodeId> = nodes.keys().cloned().collect();
        outcome.forced = enforce_minimum_healthy(
            &ids,
            &mut nodes,
            config.min_healthy,
            &config.healthy_band,
            rng,
        );

        info!(
            nodes = nodes.len(),
            faults = outcome.faulted.len(),
            forced = outcome.forced.len(),
            "Advanced metrics table"
        );

        outcome.metrics = (*nodes).clone();
        outcome
    }

    /// Aggregate statistics against a safety threshold
    pub fn statistics(&self, threshold: ReputationScore) -> ReputationStatistics {
        let snapshot = self.snapshot();
        let scores = score_all(&snapshot);
        let total_missed = snapshot.values().map(|m| m.missed).sum();
        ReputationStatistics::from_scores(&scores, threshold, total_missed)
    }
}

/// Score every record of a snapshot
pub fn score_all(
    snapshot: &BTreeMap<NodeId, NodeMetrics>,
) -> BTreeMap<NodeId, ReputationScore> {
    snapshot
        .iter()
        .map(|(id, metrics)| (id.clone(), score(metrics)))
        .collect()
}

/// Reputation statistics for one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationStatistics {
    pub total_nodes: usize,

    /// Nodes strictly above the threshold
    pub safe_nodes: usize,

    pub unsafe_nodes: usize,

    pub average_score: f64,

    pub highest_score: ReputationScore,

    pub lowest_score: ReputationScore,

    /// Sum of `missed` across every node
    pub total_missed: u64,
}

impl ReputationStatistics {
    pub fn from_scores(
        scores: &BTreeMap<NodeId, ReputationScore>,
        threshold: ReputationScore,
        total_missed: u64,
    ) -> Self {
        let mut stats = Self {
            total_missed,
            ..Default::default()
        };
        if scores.is_empty() {
            return stats;
        }

        stats.lowest_score = ReputationScore::MAX;
        let mut sum = 0u64;
        for score in scores.values().copied() {
            stats.total_nodes += 1;
            if is_safe(score, threshold) {
                stats.safe_nodes += 1;
            } else {
                stats.unsafe_nodes += 1;
            }
            sum += u64::from(score);
            stats.highest_score = stats.highest_score.max(score);
            stats.lowest_score = stats.lowest_score.min(score);
        }
        stats.average_score = sum as f64 / stats.total_nodes as f64;

        stats
    }
}
