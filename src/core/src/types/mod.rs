//! Shared types for the RelayGate workspace

pub mod node;

// Re-export commonly used types
pub use node::{NodeId, ReputationScore, MAX_SCORE};
