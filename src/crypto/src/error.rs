//! Error types for the cryptography module

use thiserror::Error;

/// Result type alias for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// KEM ciphertext was not produced for this key pair
    #[error("Invalid ciphertext")]
    InvalidCiphertext,

    /// AEAD tag did not verify; no plaintext is released
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// Malformed public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Malformed secret key
    #[error("Invalid secret key")]
    InvalidSecretKey,

    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Unknown algorithm name
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Envelope serialization failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Envelope deserialization failed
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// Random number generation failed
    #[error("Random number generation failed: {0}")]
    RandomGeneration(String),
}

impl CryptoError {
    /// Whether this error is a verification failure that must never be retried
    /// with the same inputs
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::InvalidCiphertext | CryptoError::AuthenticationFailure
        )
    }

    /// Whether this error stems from malformed key material
    pub fn is_key_material(&self) -> bool {
        matches!(
            self,
            CryptoError::InvalidPublicKey | CryptoError::InvalidSecretKey | CryptoError::InvalidKey(_)
        )
    }
}
