//! Hash-chained KEM
//!
//! ```text
//! pk = H("pk_from_sk:" || sk)
//! ss = H("ss_from_pk:" || pk)
//! ct = H("ct_from_pk:" || pk)
//! ```
//!
//! `H` is SHA3-256. Decapsulation re-derives `pk` from the secret key and
//! rejects any ciphertext other than the one bound to that public key.
//! Encapsulation carries no per-call randomness: every delivery to the same
//! public key yields the same ciphertext and shared secret.

use super::{
    constant_time_eq, Encapsulation, KemAlgorithm, KemCiphertext, KeyEncapsulation, KeyPair,
    PublicKey, SecretKey, SharedSecret,
};
use crate::error::{CryptoError, Result};
use crate::hash::Sha3Hash256;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

const PUBLIC_KEY_LABEL: &[u8] = b"pk_from_sk:";
const SHARED_SECRET_LABEL: &[u8] = b"ss_from_pk:";
const CIPHERTEXT_LABEL: &[u8] = b"ct_from_pk:";

/// Secret key size in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Public key size in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Ciphertext size in bytes
pub const CIPHERTEXT_SIZE: usize = 32;

/// Hash-chained KEM implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct HashChainKem;

impl HashChainKem {
    /// Create a new hash-chain KEM instance
    pub fn new() -> Self {
        Self
    }

    /// Rebuild a key pair from existing secret key bytes
    pub fn keypair_from_secret(secret: &[u8]) -> Result<KeyPair> {
        if secret.len() != SECRET_KEY_SIZE {
            return Err(CryptoError::InvalidSecretKey);
        }
        let secret_key = SecretKey::from_bytes(secret);
        let public_key = Self::derive_public_key(&secret_key);
        Ok(KeyPair {
            public_key,
            secret_key,
        })
    }

    /// Derive the public key bound to a secret key
    pub fn derive_public_key(secret_key: &SecretKey) -> PublicKey {
        let digest = Sha3Hash256::labeled(PUBLIC_KEY_LABEL, &[secret_key.as_bytes()]);
        PublicKey::from_bytes(digest.as_bytes())
    }

    fn ciphertext_for(public_key: &[u8]) -> Sha3Hash256 {
        Sha3Hash256::labeled(CIPHERTEXT_LABEL, &[public_key])
    }

    fn shared_secret_for(public_key: &[u8]) -> SharedSecret {
        SharedSecret::new(Sha3Hash256::labeled(SHARED_SECRET_LABEL, &[public_key]).to_vec())
    }
}

impl KeyEncapsulation for HashChainKem {
    fn algorithm(&self) -> KemAlgorithm {
        KemAlgorithm::HashChain
    }

    fn generate_keypair(&self) -> Result<KeyPair> {
        let mut secret = [0u8; SECRET_KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut secret)
            .map_err(|e| CryptoError::RandomGeneration(e.to_string()))?;
        let keypair = Self::keypair_from_secret(&secret);
        secret.zeroize();
        keypair
    }

    fn encapsulate(&self, public_key: &PublicKey) -> Result<Encapsulation> {
        let pk = public_key.as_bytes();
        if pk.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidPublicKey);
        }

        Ok(Encapsulation {
            ciphertext: KemCiphertext::from_bytes(Self::ciphertext_for(pk).as_bytes()),
            shared_secret: Self::shared_secret_for(pk),
        })
    }

    fn decapsulate(
        &self,
        ciphertext: &KemCiphertext,
        secret_key: &SecretKey,
    ) -> Result<SharedSecret> {
        if secret_key.as_bytes().len() != SECRET_KEY_SIZE {
            return Err(CryptoError::InvalidSecretKey);
        }
        if ciphertext.as_bytes().len() != CIPHERTEXT_SIZE {
            return Err(CryptoError::InvalidCiphertext);
        }

        let public_key = Self::derive_public_key(secret_key);
        let expected = Self::ciphertext_for(public_key.as_bytes());
        if !constant_time_eq(ciphertext.as_bytes(), expected.as_bytes()) {
            return Err(CryptoError::InvalidCiphertext);
        }

        Ok(Self::shared_secret_for(public_key.as_bytes()))
    }
}
