//! Key encapsulation mechanisms
//!
//! Every KEM is reached through [`KeyEncapsulation`] so the orchestrator and
//! the recipient never depend on a concrete construction. Two are provided:
//!
//! - [`HashChainKem`]: the hash-chained protocol shape. Deterministic per
//!   public key, so repeated deliveries to one node reuse the same secret.
//! - [`MlKem768`]: Kyber768 with a key-confirmation suffix. Randomized per
//!   encapsulation.

pub mod hash_chain;
pub mod keys;
pub mod kyber;

pub use hash_chain::HashChainKem;
pub use keys::{Encapsulation, KemCiphertext, KeyPair, PublicKey, SecretKey, SharedSecret};
pub use kyber::MlKem768;

use crate::error::{CryptoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Generic key encapsulation trait
pub trait KeyEncapsulation: Send + Sync {
    /// Algorithm implemented by this KEM
    fn algorithm(&self) -> KemAlgorithm;

    /// Generate a new key pair from OS randomness
    fn generate_keypair(&self) -> Result<KeyPair>;

    /// Produce a ciphertext and the shared secret it carries
    fn encapsulate(&self, public_key: &PublicKey) -> Result<Encapsulation>;

    /// Recover the shared secret.
    ///
    /// Fails with [`CryptoError::InvalidCiphertext`] when the ciphertext was
    /// not encapsulated for the key pair owning `secret_key`.
    fn decapsulate(&self, ciphertext: &KemCiphertext, secret_key: &SecretKey)
        -> Result<SharedSecret>;

    /// Check that both halves of a key pair belong together
    fn validate_keypair(&self, keypair: &KeyPair) -> Result<()> {
        let encapsulation = self.encapsulate(&keypair.public_key)?;
        let recovered = self.decapsulate(&encapsulation.ciphertext, &keypair.secret_key)?;
        if constant_time_eq(recovered.as_bytes(), encapsulation.shared_secret.as_bytes()) {
            Ok(())
        } else {
            Err(CryptoError::InvalidKey("secret key does not match public key".to_string()))
        }
    }
}

/// Supported KEM algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KemAlgorithm {
    #[default]
    #[serde(rename = "hash-chain")]
    HashChain,
    #[serde(rename = "ml-kem-768")]
    MlKem768,
}

impl KemAlgorithm {
    /// Configuration name of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            KemAlgorithm::HashChain => "hash-chain",
            KemAlgorithm::MlKem768 => "ml-kem-768",
        }
    }
}

impl fmt::Display for KemAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KemAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hash-chain" => Ok(KemAlgorithm::HashChain),
            "ml-kem-768" => Ok(KemAlgorithm::MlKem768),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Instantiate the KEM for an algorithm
pub fn kem_for(algorithm: KemAlgorithm) -> Arc<dyn KeyEncapsulation> {
    match algorithm {
        KemAlgorithm::HashChain => Arc::new(HashChainKem::new()),
        KemAlgorithm::MlKem768 => Arc::new(MlKem768::new()),
    }
}

/// Compare two byte strings without early exit on the first mismatch
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in [KemAlgorithm::HashChain, KemAlgorithm::MlKem768] {
            let parsed: KemAlgorithm = algorithm.as_str().parse().unwrap();
            assert_eq!(parsed, algorithm);
        }
        assert!("rsa".parse::<KemAlgorithm>().is_err());
    }

    #[test]
    fn test_kem_for_matches_algorithm() {
        assert_eq!(kem_for(KemAlgorithm::HashChain).algorithm(), KemAlgorithm::HashChain);
        assert_eq!(kem_for(KemAlgorithm::MlKem768).algorithm(), KemAlgorithm::MlKem768);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn test_validate_keypair_rejects_mismatch() {
        let kem = HashChainKem::new();
        let a = kem.generate_keypair().unwrap();
        let b = kem.generate_keypair().unwrap();
        assert!(kem.validate_keypair(&a).is_ok());

        let mixed = KeyPair {
            public_key: a.public_key.clone(),
            secret_key: b.secret_key.clone(),
        };
        assert!(kem.validate_keypair(&mixed).is_err());
    }
}
