//! Error types for the reputation engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReputationError {
    #[error("Invalid reputation configuration: {0}")]
    InvalidConfig(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Prometheus metric error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, ReputationError>;
