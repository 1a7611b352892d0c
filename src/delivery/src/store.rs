//! In-process score ledger

use async_trait::async_trait;
use dashmap::DashMap;
use relaygate_core::{NodeId, ReputationScore, Result, ScoreStore};
use relaygate_reputation::is_safe;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Local stand-in for the external score ledger.
///
/// Keeps the last published score per node. Unknown nodes score 0. The
/// safety verdict uses the same threshold as the reputation engine.
#[derive(Clone)]
pub struct InMemoryScoreStore {
    scores: Arc<DashMap<NodeId, ReputationScore>>,
    threshold: ReputationScore,
}

impl InMemoryScoreStore {
    pub fn new(threshold: ReputationScore) -> Self {
        Self {
            scores: Arc::new(DashMap::new()),
            threshold,
        }
    }

    pub fn threshold(&self) -> ReputationScore {
        self.threshold
    }

    /// Every stored score in id order
    pub fn snapshot(&self) -> BTreeMap<NodeId, ReputationScore> {
        self.scores
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn update_score(&self, node_id: &NodeId, score: ReputationScore) -> Result<()> {
        self.scores.insert(node_id.clone(), score);
        Ok(())
    }

    async fn get_score(&self, node_id: &NodeId) -> Result<ReputationScore> {
        Ok(self.scores.get(node_id).map(|s| *s).unwrap_or(0))
    }

    async fn is_safe(&self, node_id: &NodeId) -> Result<bool> {
        Ok(is_safe(self.get_score(node_id).await?, self.threshold))
    }
}
