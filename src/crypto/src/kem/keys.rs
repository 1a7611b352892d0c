//! Opaque key material shared by every KEM implementation

use crate::encoding::hex_bytes;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Recipient public key
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde(with = "hex_bytes")] Vec<u8>);

impl PublicKey {
    /// Wrap raw public key bytes; validation happens at encapsulation time
    pub fn from_bytes(bytes: &[u8]) -> Self {
        PublicKey(bytes.to_vec())
    }

    /// Get public key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = self.to_hex();
        let shown = &hex[..hex.len().min(16)];
        write!(f, "PublicKey({}.., {} bytes)", shown, self.0.len())
    }
}

/// Recipient secret key, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(#[serde(with = "hex_bytes")] Vec<u8>);

impl SecretKey {
    /// Wrap raw secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        SecretKey(bytes.to_vec())
    }

    /// Get secret key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED; {}])", self.0.len())
    }
}

/// Public/secret key pair produced by a KEM
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

/// KEM ciphertext sent alongside the sealed payload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KemCiphertext(#[serde(with = "hex_bytes")] Vec<u8>);

impl KemCiphertext {
    /// Wrap raw ciphertext bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        KemCiphertext(bytes.to_vec())
    }

    /// Get ciphertext bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for KemCiphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KemCiphertext")
            .field("size", &self.0.len())
            .finish()
    }
}

/// Shared secret agreed through the KEM, wiped on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        SharedSecret(bytes)
    }

    /// Get shared secret bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED; {}])", self.0.len())
    }
}

/// Output of a single encapsulation call
#[derive(Debug)]
pub struct Encapsulation {
    pub ciphertext: KemCiphertext,
    pub shared_secret: SharedSecret,
}
