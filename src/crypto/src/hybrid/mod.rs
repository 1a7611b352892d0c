//! Hybrid encryption: a KEM shared secret keys an AES-256-GCM envelope

pub mod aead;
pub mod envelope;

pub use aead::{derive_symmetric_key, open, seal, SealedPayload, SymmetricKey};
pub use envelope::{decrypt_with, encrypt_for, Envelope};
