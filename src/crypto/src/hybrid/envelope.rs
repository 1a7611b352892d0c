//! Delivery envelope: KEM ciphertext plus the AES-GCM sealed payload

use super::aead::{derive_symmetric_key, open, seal, SealedPayload, NONCE_SIZE, TAG_SIZE};
use crate::encoding::{hex_array, hex_bytes};
use crate::error::{CryptoError, Result};
use crate::kem::{KemCiphertext, KeyEncapsulation, PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

/// Everything a recipient needs to recover the payload with its secret key.
///
/// JSON renders every field as hex; bincode keeps them raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(with = "hex_array")]
    iv: [u8; NONCE_SIZE],
    #[serde(with = "hex_array")]
    tag: [u8; TAG_SIZE],
    #[serde(with = "hex_bytes")]
    ciphertext: Vec<u8>,
    #[serde(with = "hex_bytes")]
    kem_ciphertext: Vec<u8>,
}

impl Envelope {
    /// Assemble an envelope from a KEM ciphertext and a sealed payload
    pub fn new(kem_ciphertext: KemCiphertext, sealed: SealedPayload) -> Self {
        Self {
            iv: sealed.iv,
            tag: sealed.tag,
            ciphertext: sealed.ciphertext,
            kem_ciphertext: kem_ciphertext.into_bytes(),
        }
    }

    /// Assemble an envelope from raw parts
    pub fn from_parts(
        iv: [u8; NONCE_SIZE],
        tag: [u8; TAG_SIZE],
        ciphertext: Vec<u8>,
        kem_ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            iv,
            tag,
            ciphertext,
            kem_ciphertext,
        }
    }

    pub fn iv(&self) -> &[u8; NONCE_SIZE] {
        &self.iv
    }

    pub fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn kem_ciphertext(&self) -> KemCiphertext {
        KemCiphertext::from_bytes(&self.kem_ciphertext)
    }

    /// Total bytes carried by the envelope
    pub fn size(&self) -> usize {
        NONCE_SIZE + TAG_SIZE + self.ciphertext.len() + self.kem_ciphertext.len()
    }

    /// Serialize to compact binary
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::Serialization(e.to_string()))
    }

    /// Deserialize from compact binary
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }

    /// Serialize to pretty JSON with hex fields
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CryptoError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }
}

/// Encapsulate to `public_key` and seal `payload` under the derived key
pub fn encrypt_for(
    kem: &dyn KeyEncapsulation,
    public_key: &PublicKey,
    payload: &[u8],
) -> Result<Envelope> {
    let encapsulation = kem.encapsulate(public_key)?;
    let key = derive_symmetric_key(&encapsulation.shared_secret);
    let sealed = seal(&key, payload)?;
    Ok(Envelope::new(encapsulation.ciphertext, sealed))
}

/// Decapsulate with `secret_key` and open the sealed payload
pub fn decrypt_with(
    kem: &dyn KeyEncapsulation,
    secret_key: &SecretKey,
    envelope: &Envelope,
) -> Result<Vec<u8>> {
    let shared_secret = kem.decapsulate(&envelope.kem_ciphertext(), secret_key)?;
    let key = derive_symmetric_key(&shared_secret);
    open(&key, &envelope.iv, &envelope.ciphertext, &envelope.tag)
}
