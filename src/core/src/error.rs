//! Unified error types for the RelayGate workspace
//!
//! Score store implementations report failures with this type so that
//! they can implement the shared traits without depending on the library
//! crates.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for the RelayGate workspace
#[derive(Debug, Error)]
pub enum CoreError {
    /// Score store rejected or failed an operation
    #[error("Score store error: {0}")]
    Store(String),
}

impl CoreError {
    /// Create a score store error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        CoreError::Store(msg.into())
    }
}
