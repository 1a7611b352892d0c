//! Reputation scoring
//!
//! ```text
//! latency_score = 100 - (min(latency, 200) / 200) * 100
//! raw           = 0.5 * uptime + 0.3 * accuracy + 0.2 * latency_score
//! score         = floor(clamp(raw, 0, 100))
//! ```

use crate::types::{NodeId, NodeMetrics, ReputationScore, MAX_SCORE};
use std::collections::BTreeMap;

pub const UPTIME_WEIGHT: f64 = 0.5;
pub const ACCURACY_WEIGHT: f64 = 0.3;
pub const LATENCY_WEIGHT: f64 = 0.2;

/// Latencies at or above this contribute nothing
pub const LATENCY_CAP_MS: f64 = 200.0;

/// Map a health record to an integer score in `[0, 100]`
pub fn score(metrics: &NodeMetrics) -> ReputationScore {
    let latency_score = 100.0 - (metrics.latency.min(LATENCY_CAP_MS) / LATENCY_CAP_MS) * 100.0;
    let raw = UPTIME_WEIGHT * metrics.uptime
        + ACCURACY_WEIGHT * metrics.accuracy
        + LATENCY_WEIGHT * latency_score;

    // NaN collapses to 0 through the saturating cast
    raw.clamp(0.0, MAX_SCORE as f64).floor() as ReputationScore
}

/// Eligibility predicate: strictly above the threshold
pub fn is_safe(score: ReputationScore, threshold: ReputationScore) -> bool {
    score > threshold
}

/// Split scored nodes into (safe, unsafe), both in id order
pub fn partition(
    scores: &BTreeMap<NodeId, ReputationScore>,
    threshold: ReputationScore,
) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut safe = Vec::new();
    let mut not_safe = Vec::new();
    for (id, score) in scores {
        if is_safe(*score, threshold) {
            safe.push(id.clone());
        } else {
            not_safe.push(id.clone());
        }
    }
    (safe, not_safe)
}
