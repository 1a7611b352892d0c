//! # RelayGate Cryptography Module
//!
//! Key encapsulation and authenticated encryption for handing a payload to a
//! single recipient node.
//!
//! ## Features
//!
//! - **KEM seam**: [`KeyEncapsulation`] with a hash-chained construction
//!   ([`HashChainKem`]) and ML-KEM-768 ([`MlKem768`]) behind one interface
//! - **Hybrid envelope**: KEM shared secret -> BLAKE3 key derivation ->
//!   AES-256-GCM with a detached tag
//! - **Hashing**: SHA3-256 with domain labels, BLAKE3 key derivation
//!
//! ## Module Structure
//!
//! ```text
//! crypto/
//! ├── kem/        - Key encapsulation mechanisms and key material
//! ├── hybrid/     - AEAD sealing and the delivery envelope
//! ├── hash/       - Cryptographic hash functions
//! └── encoding    - Hex/binary serde helpers for byte fields
//! ```

pub mod encoding;
pub mod error;
pub mod hash;
pub mod hybrid;
pub mod kem;

pub use error::{CryptoError, Result};
pub use hash::{Sha3Hash256, BLAKE3Hash};
pub use hybrid::{
    decrypt_with, derive_symmetric_key, encrypt_for, open, seal, Envelope, SealedPayload,
    SymmetricKey,
};
pub use kem::{
    kem_for, Encapsulation, HashChainKem, KemAlgorithm, KemCiphertext, KeyEncapsulation,
    KeyPair, MlKem768, PublicKey, SecretKey, SharedSecret,
};
