//! AES-256-GCM sealing with keys derived from a KEM shared secret

use crate::error::{CryptoError, Result};
use crate::hash::BLAKE3Hash;
use crate::kem::SharedSecret;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-GCM nonce size in bytes
pub const NONCE_SIZE: usize = 12;

/// AES-GCM tag size in bytes
pub const TAG_SIZE: usize = 16;

/// AES-256 key size in bytes
pub const KEY_SIZE: usize = 32;

const KEY_DERIVATION_LABEL: &[u8] = b"relaygate-envelope-aes256gcm-v1";

/// Symmetric key for one envelope
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        SymmetricKey(bytes)
    }

    /// Get key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Output of [`seal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub iv: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Derive the AES-256 key from a KEM shared secret using BLAKE3
pub fn derive_symmetric_key(shared_secret: &SharedSecret) -> SymmetricKey {
    let digest = BLAKE3Hash::derive(KEY_DERIVATION_LABEL, shared_secret.as_bytes());
    SymmetricKey(*digest.as_bytes())
}

/// Encrypt `plaintext` under a fresh random nonce
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedPayload> {
    let mut iv = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::RandomGeneration(e.to_string()))?;

    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| CryptoError::Encryption(format!("AES encryption failed: {}", e)))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedPayload {
        iv,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Decrypt and authenticate.
///
/// Returns [`CryptoError::AuthenticationFailure`] when the tag does not verify.
/// The scratch buffer is wiped before returning an error.
pub fn open(
    key: &SymmetricKey,
    iv: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let mut buffer = ciphertext.to_vec();

    match cipher.decrypt_in_place_detached(
        GenericArray::from_slice(iv),
        b"",
        &mut buffer,
        GenericArray::from_slice(tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(CryptoError::AuthenticationFailure)
        }
    }
}
