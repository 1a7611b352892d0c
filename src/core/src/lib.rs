//! # RelayGate Core
//!
//! Shared types, traits, and error handling for the RelayGate workspace.
//! The reputation, crypto, and delivery crates depend on this package for
//! node identifiers and the external score-store contract.

pub mod types;
pub mod traits;
pub mod error;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::ScoreStore;
pub use types::{NodeId, ReputationScore, MAX_SCORE};
