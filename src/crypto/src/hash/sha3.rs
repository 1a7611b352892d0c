use sha3::{Digest, Sha3_256};

/// SHA3-256 hash output
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Sha3Hash256([u8; 32]);

impl Sha3Hash256 {
    /// Hash data using SHA3-256
    pub fn hash(data: &[u8]) -> Self {
        Self::labeled(b"", &[data])
    }

    /// Hash a domain label followed by each part, with no separators.
    ///
    /// `labeled(b"pk_from_sk:", &[sk])` is `SHA3-256("pk_from_sk:" || sk)`.
    pub fn labeled(label: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(label);
        for part in parts {
            hasher.update(part);
        }
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        Sha3Hash256(hash)
    }

    /// Get hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy the digest into an owned buffer
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}
