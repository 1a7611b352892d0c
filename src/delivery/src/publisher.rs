//! Best-effort score publishing
//!
//! Every write to the score store is bounded by a timeout. Failures are
//! logged and counted; they never abort the round loop.

use futures::future::join_all;
use relaygate_core::{NodeId, ReputationScore, ScoreStore};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outcome of publishing one round of scores
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub updated: usize,
    pub failed: Vec<NodeId>,
    pub timed_out: Vec<NodeId>,
}

impl PublishSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }
}

/// Push every score to `store`, one bounded call per node
pub async fn publish_scores(
    store: &dyn ScoreStore,
    scores: &BTreeMap<NodeId, ReputationScore>,
    per_call_timeout: Duration,
) -> PublishSummary {
    let calls = scores.iter().map(|(node_id, score)| async move {
        let result = timeout(per_call_timeout, store.update_score(node_id, *score)).await;
        (node_id, *score, result)
    });

    let mut summary = PublishSummary::default();
    for (node_id, score, result) in join_all(calls).await {
        match result {
            Ok(Ok(())) => {
                debug!(node_id = %node_id, score, "Published score");
                summary.updated += 1;
            }
            Ok(Err(e)) => {
                warn!(node_id = %node_id, score, error = %e, "update_score failed");
                summary.failed.push(node_id.clone());
            }
            Err(_) => {
                warn!(
                    node_id = %node_id,
                    score,
                    timeout_ms = per_call_timeout.as_millis() as u64,
                    "update_score timed out"
                );
                summary.timed_out.push(node_id.clone());
            }
        }
    }

    summary
}
