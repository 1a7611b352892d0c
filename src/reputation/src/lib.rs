//! Reputation engine for RelayGate
//!
//! Tracks per-node health and turns it into an integer score (0-100) that
//! decides which nodes may receive deliveries:
//! - **Evolution**: bounded random walk of uptime, latency and accuracy with
//!   occasional fault events
//! - **Scoring**: `0.5 * uptime + 0.3 * accuracy + 0.2 * latency_score`
//! - **Eligibility**: a node is safe when its score is strictly above the
//!   configured threshold
//! - **Minimum healthy set**: the top-ranked nodes are forced into a healthy
//!   band every round so at least `min_healthy` nodes stay safe

pub mod error;
pub mod evolution;
pub mod health;
pub mod metrics;
pub mod reputation_tracker;
pub mod score;
pub mod types;

pub use error::{ReputationError, Result};
pub use evolution::evolve;
pub use health::{enforce_minimum_healthy, rank};
pub use metrics::{
    get_registry, global_registry, record_fault, record_forced_healthy, record_round,
    register_metrics, update_node_reputation_score, update_reputation_metrics,
    ReputationMetrics,
};
pub use reputation_tracker::{score_all, MetricsTable, ReputationStatistics, RoundAdvance};
pub use score::{is_safe, partition, score};
pub use types::{
    BandRange, EvolutionParams, HealthyBand, NodeId, NodeMetrics, ReputationConfig,
    ReputationScore, MAX_SCORE,
};
