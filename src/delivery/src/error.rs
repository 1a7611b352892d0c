//! Error types for delivery rounds

use relaygate_core::{CoreError, NodeId};
use relaygate_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// No node scored above the safety threshold this round
    #[error("No eligible recipient")]
    NoEligibleRecipient,

    /// Malformed or missing key material, bad registry or settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Opened payload does not match what was sealed
    #[error("Payload mismatch for recipient {0}")]
    PayloadMismatch(NodeId),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        DeliveryError::Configuration(msg.into())
    }

    /// Whether the round loop can carry on past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeliveryError::NoEligibleRecipient)
    }
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
