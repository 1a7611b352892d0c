//! Minimum healthy set enforcement

use crate::score::score;
use crate::types::{HealthyBand, NodeId, NodeMetrics, ReputationScore};
use rand::Rng;
use std::collections::BTreeMap;

/// Rank `node_ids` by score, highest first, ties broken by id ascending.
/// Ids missing from `table` are skipped.
pub fn rank(
    node_ids: &[NodeId],
    table: &BTreeMap<NodeId, NodeMetrics>,
) -> Vec<(NodeId, ReputationScore)> {
    let mut ranked: Vec<(NodeId, ReputationScore)> = node_ids
        .iter()
        .filter_map(|id| table.get(id).map(|m| (id.clone(), score(m))))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.dedup_by(|a, b| a.0 == b.0);
    ranked
}

/// Force the top `k` ranked nodes into the healthy band.
///
/// Only uptime, accuracy and latency are rewritten; `missed` and
/// `epochs_active` are left alone. Returns the forced ids in rank order.
pub fn enforce_minimum_healthy<R: Rng + ?Sized>(
    node_ids: &[NodeId],
    table: &mut BTreeMap<NodeId, NodeMetrics>,
    k: usize,
    band: &HealthyBand,
    rng: &mut R,
) -> Vec<NodeId> {
    let forced: Vec<NodeId> = rank(node_ids, table)
        .into_iter()
        .take(k)
        .map(|(id, _)| id)
        .collect();

    for id in &forced {
        if let Some(metrics) = table.get_mut(id) {
            band.apply(metrics, rng);
        }
    }

    forced
}
