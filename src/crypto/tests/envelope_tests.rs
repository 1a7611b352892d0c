//! Envelope tests: KEM + AEAD composition and tamper detection

use relaygate_crypto::{
    decrypt_with, encrypt_for, kem_for, CryptoError, Envelope, KemAlgorithm,
};

#[cfg(test)]
mod round_trip_tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip_all_algorithms() {
        for algorithm in [KemAlgorithm::HashChain, KemAlgorithm::MlKem768] {
            let kem = kem_for(algorithm);
            let keypair = kem.generate_keypair().unwrap();
            let payload = b"model weights v3".to_vec();

            let envelope = encrypt_for(kem.as_ref(), &keypair.public_key, &payload).unwrap();
            let opened = decrypt_with(kem.as_ref(), &keypair.secret_key, &envelope).unwrap();
            assert_eq!(opened, payload);
        }
    }

    #[test]
    fn test_opening_is_idempotent() {
        let kem = kem_for(KemAlgorithm::HashChain);
        let keypair = kem.generate_keypair().unwrap();
        let envelope = encrypt_for(kem.as_ref(), &keypair.public_key, b"twice").unwrap();

        let first = decrypt_with(kem.as_ref(), &keypair.secret_key, &envelope).unwrap();
        let second = decrypt_with(kem.as_ref(), &keypair.secret_key, &envelope).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_chain_envelopes_differ_by_nonce_only() {
        let kem = kem_for(KemAlgorithm::HashChain);
        let keypair = kem.generate_keypair().unwrap();
        let a = encrypt_for(kem.as_ref(), &keypair.public_key, b"same").unwrap();
        let b = encrypt_for(kem.as_ref(), &keypair.public_key, b"same").unwrap();

        assert_eq!(a.kem_ciphertext(), b.kem_ciphertext());
        assert_ne!(a.iv(), b.iv());
    }

    #[test]
    fn test_json_transport_round_trip() {
        let kem = kem_for(KemAlgorithm::MlKem768);
        let keypair = kem.generate_keypair().unwrap();
        let envelope = encrypt_for(kem.as_ref(), &keypair.public_key, b"over the wire").unwrap();

        let received = Envelope::from_json(&envelope.to_json().unwrap()).unwrap();
        let opened = decrypt_with(kem.as_ref(), &keypair.secret_key, &received).unwrap();
        assert_eq!(opened, b"over the wire");
    }

    #[test]
    fn test_binary_transport_round_trip() {
        let kem = kem_for(KemAlgorithm::HashChain);
        let keypair = kem.generate_keypair().unwrap();
        let envelope = encrypt_for(kem.as_ref(), &keypair.public_key, &[0u8; 1024]).unwrap();

        let received = Envelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(received, envelope);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_wrong_recipient_fails_at_decapsulation() {
        let kem = kem_for(KemAlgorithm::HashChain);
        let recipient = kem.generate_keypair().unwrap();
        let other = kem.generate_keypair().unwrap();
        let envelope = encrypt_for(kem.as_ref(), &recipient.public_key, b"not yours").unwrap();

        let result = decrypt_with(kem.as_ref(), &other.secret_key, &envelope);
        assert!(matches!(result, Err(CryptoError::InvalidCiphertext)));
    }

    #[test]
    fn test_tampered_iv_fails_authentication() {
        let kem = kem_for(KemAlgorithm::HashChain);
        let keypair = kem.generate_keypair().unwrap();
        let envelope = encrypt_for(kem.as_ref(), &keypair.public_key, b"payload").unwrap();

        let mut iv = *envelope.iv();
        iv[0] ^= 0x01;
        let tampered = Envelope::from_parts(
            iv,
            *envelope.tag(),
            envelope.ciphertext().to_vec(),
            envelope.kem_ciphertext().into_bytes(),
        );

        let result = decrypt_with(kem.as_ref(), &keypair.secret_key, &tampered);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_truncated_ciphertext_fails_authentication() {
        let kem = kem_for(KemAlgorithm::HashChain);
        let keypair = kem.generate_keypair().unwrap();
        let envelope = encrypt_for(kem.as_ref(), &keypair.public_key, b"payload").unwrap();

        let ciphertext = envelope.ciphertext();
        let tampered = Envelope::from_parts(
            *envelope.iv(),
            *envelope.tag(),
            ciphertext[..ciphertext.len() - 1].to_vec(),
            envelope.kem_ciphertext().into_bytes(),
        );

        let result = decrypt_with(kem.as_ref(), &keypair.secret_key, &tampered);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }
}
