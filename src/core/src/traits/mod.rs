//! Shared traits for the RelayGate workspace

pub mod score_store;

// Re-export commonly used traits
pub use score_store::ScoreStore;
