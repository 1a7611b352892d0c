//! Serde helpers for byte fields.
//!
//! Human-readable formats (JSON, TOML) carry bytes as lowercase hex strings,
//! matching the registry files operators edit by hand. Binary formats
//! (bincode) carry them as length-prefixed raw bytes.

/// Variable-length byte fields
pub mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(bytes: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes.as_ref()))
        } else {
            serializer.serialize_bytes(bytes.as_ref())
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            let trimmed = encoded.strip_prefix("0x").unwrap_or(&encoded);
            hex::decode(trimmed).map_err(de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}

/// Fixed-width byte fields
pub mod hex_array {
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::hex_bytes::serialize(bytes, serializer)
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = super::hex_bytes::deserialize(deserializer)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| de::Error::invalid_length(len, &"a fixed-width byte array"))
    }
}
