use super::{
    constant_time_eq, Encapsulation, KemAlgorithm, KemCiphertext, KeyEncapsulation, KeyPair,
    PublicKey, SecretKey, SharedSecret,
};
use crate::error::{CryptoError, Result};
use crate::hash::Sha3Hash256;
use pqcrypto_kyber::kyber768;
use pqcrypto_traits::kem::{
    Ciphertext as PQCiphertext, PublicKey as PQPublicKey, SecretKey as PQSecretKey,
    SharedSecret as PQSharedSecret,
};

const CONFIRMATION_LABEL: &[u8] = b"kc_from_ss:";

/// Bytes of key confirmation appended to the Kyber ciphertext
pub const CONFIRMATION_SIZE: usize = 16;

/// ML-KEM-768 (Kyber768) implementation.
///
/// Kyber decapsulation never fails on its own: a foreign ciphertext yields a
/// pseudo-random secret (implicit rejection). The ciphertext therefore carries
/// `H("kc_from_ss:" || ss || kyber_ct)[..16]`, which the recipient recomputes
/// to turn a mismatch into [`CryptoError::InvalidCiphertext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MlKem768;

impl MlKem768 {
    /// Create a new ML-KEM-768 instance
    pub fn new() -> Self {
        Self
    }

    /// Size of a full ciphertext including the confirmation suffix
    pub fn ciphertext_size() -> usize {
        kyber768::ciphertext_bytes() + CONFIRMATION_SIZE
    }

    fn confirmation(shared_secret: &[u8], kyber_ciphertext: &[u8]) -> [u8; CONFIRMATION_SIZE] {
        let digest = Sha3Hash256::labeled(CONFIRMATION_LABEL, &[shared_secret, kyber_ciphertext]);
        let mut tag = [0u8; CONFIRMATION_SIZE];
        tag.copy_from_slice(&digest.as_bytes()[..CONFIRMATION_SIZE]);
        tag
    }
}

impl KeyEncapsulation for MlKem768 {
    fn algorithm(&self) -> KemAlgorithm {
        KemAlgorithm::MlKem768
    }

    fn generate_keypair(&self) -> Result<KeyPair> {
        let (pk, sk) = kyber768::keypair();
        Ok(KeyPair {
            public_key: PublicKey::from_bytes(pk.as_bytes()),
            secret_key: SecretKey::from_bytes(sk.as_bytes()),
        })
    }

    fn encapsulate(&self, public_key: &PublicKey) -> Result<Encapsulation> {
        let pk = kyber768::PublicKey::from_bytes(public_key.as_bytes())
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let (ss, ct) = kyber768::encapsulate(&pk);

        let mut ciphertext = ct.as_bytes().to_vec();
        ciphertext.extend_from_slice(&Self::confirmation(ss.as_bytes(), ct.as_bytes()));

        Ok(Encapsulation {
            ciphertext: KemCiphertext::from_bytes(&ciphertext),
            shared_secret: SharedSecret::new(ss.as_bytes().to_vec()),
        })
    }

    fn decapsulate(
        &self,
        ciphertext: &KemCiphertext,
        secret_key: &SecretKey,
    ) -> Result<SharedSecret> {
        let bytes = ciphertext.as_bytes();
        if bytes.len() != Self::ciphertext_size() {
            return Err(CryptoError::InvalidCiphertext);
        }
        let (kyber_bytes, confirmation) = bytes.split_at(kyber768::ciphertext_bytes());

        let sk = kyber768::SecretKey::from_bytes(secret_key.as_bytes())
            .map_err(|_| CryptoError::InvalidSecretKey)?;
        let ct = kyber768::Ciphertext::from_bytes(kyber_bytes)
            .map_err(|_| CryptoError::InvalidCiphertext)?;
        let ss = kyber768::decapsulate(&ct, &sk);

        let expected = Self::confirmation(ss.as_bytes(), kyber_bytes);
        if !constant_time_eq(confirmation, &expected) {
            return Err(CryptoError::InvalidCiphertext);
        }

        Ok(SharedSecret::new(ss.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kem_encapsulation_decapsulation() {
        let kem = MlKem768::new();
        let keypair = kem.generate_keypair().unwrap();
        let encapsulation = kem.encapsulate(&keypair.public_key).unwrap();
        let recovered = kem
            .decapsulate(&encapsulation.ciphertext, &keypair.secret_key)
            .unwrap();

        assert_eq!(recovered.as_bytes(), encapsulation.shared_secret.as_bytes());
        assert_eq!(encapsulation.ciphertext.as_bytes().len(), MlKem768::ciphertext_size());
    }

    #[test]
    fn test_encapsulation_is_randomized() {
        let kem = MlKem768::new();
        let keypair = kem.generate_keypair().unwrap();
        let first = kem.encapsulate(&keypair.public_key).unwrap();
        let second = kem.encapsulate(&keypair.public_key).unwrap();

        assert_ne!(first.ciphertext, second.ciphertext);
        assert_ne!(first.shared_secret, second.shared_secret);
    }

    #[test]
    fn test_wrong_secret_key_rejected() {
        let kem = MlKem768::new();
        let alice = kem.generate_keypair().unwrap();
        let bob = kem.generate_keypair().unwrap();
        let encapsulation = kem.encapsulate(&alice.public_key).unwrap();

        let result = kem.decapsulate(&encapsulation.ciphertext, &bob.secret_key);
        assert!(matches!(result, Err(CryptoError::InvalidCiphertext)));
    }

    #[test]
    fn test_malformed_public_key() {
        let kem = MlKem768::new();
        let bogus = PublicKey::from_bytes(&[0u8; 12]);
        assert!(matches!(kem.encapsulate(&bogus), Err(CryptoError::InvalidPublicKey)));
    }
}
