use blake3::Hasher;

/// BLAKE3 hash output (32 bytes)
pub struct BLAKE3Hash([u8; 32]);

impl BLAKE3Hash {
    /// Hash data using BLAKE3
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(data);
        BLAKE3Hash(*hasher.finalize().as_bytes())
    }

    /// Hash key material behind a fixed context label
    pub fn derive(context: &[u8], material: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(context);
        hasher.update(material);
        BLAKE3Hash(*hasher.finalize().as_bytes())
    }

    /// Get hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
