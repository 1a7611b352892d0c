//! RelayGate delivery node
//!
//! Wires the reputation engine, the KEM envelope and the delivery
//! orchestrator into a long-running process: TOML configuration, a fixed
//! interval round scheduler, best-effort score publishing, an envelope
//! outbox and a Prometheus endpoint.

pub mod config;
pub mod node;

pub use config::NodeConfig;
pub use node::{
    render_metrics, score_registry, write_envelope, write_scores, DeliveryNode, RoundSummary,
};
