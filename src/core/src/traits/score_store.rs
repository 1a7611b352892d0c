//! Score store contract
//!
//! The authoritative score ledger lives outside this workspace (an on-chain
//! contract in production deployments). Rounds publish scores into it and
//! collaborators query it for the safety verdict. Implementations may be
//! remote and slow; callers bound every call with their own timeout.

use crate::error::Result;
use crate::types::{NodeId, ReputationScore};
use async_trait::async_trait;

/// Authoritative, possibly remote, reputation ledger
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Record the latest score for a node
    async fn update_score(&self, node_id: &NodeId, score: ReputationScore) -> Result<()>;

    /// Fetch the last recorded score for a node
    async fn get_score(&self, node_id: &NodeId) -> Result<ReputationScore>;

    /// Whether the store considers the node an eligible recipient
    async fn is_safe(&self, node_id: &NodeId) -> Result<bool>;

    /// Record a batch of scores, stopping at the first failure
    async fn update_scores(&self, scores: &[(NodeId, ReputationScore)]) -> Result<()> {
        for (node_id, score) in scores {
            self.update_score(node_id, *score).await?;
        }
        Ok(())
    }
}
