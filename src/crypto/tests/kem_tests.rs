//! Key encapsulation tests across every supported algorithm

use relaygate_crypto::{
    kem_for, CryptoError, HashChainKem, KemAlgorithm, KemCiphertext, KeyEncapsulation, KeyPair,
};

const ALGORITHMS: [KemAlgorithm; 2] = [KemAlgorithm::HashChain, KemAlgorithm::MlKem768];

#[cfg(test)]
mod keypair_generation_tests {
    use super::*;

    #[test]
    fn test_generated_keypairs_are_unique() {
        for algorithm in ALGORITHMS {
            let kem = kem_for(algorithm);
            let a = kem.generate_keypair().unwrap();
            let b = kem.generate_keypair().unwrap();
            assert_ne!(a.public_key, b.public_key, "{}", algorithm);
            assert_ne!(a.secret_key, b.secret_key, "{}", algorithm);
        }
    }

    #[test]
    fn test_each_keypair_round_trips_independently() {
        for algorithm in ALGORITHMS {
            let kem = kem_for(algorithm);
            for _ in 0..2 {
                let keypair = kem.generate_keypair().unwrap();
                let encapsulation = kem.encapsulate(&keypair.public_key).unwrap();
                let recovered = kem
                    .decapsulate(&encapsulation.ciphertext, &keypair.secret_key)
                    .unwrap();
                assert_eq!(recovered, encapsulation.shared_secret);
            }
        }
    }

    #[test]
    fn test_hash_chain_keypair_rebuilt_from_secret() {
        let kem = HashChainKem::new();
        let keypair = kem.generate_keypair().unwrap();
        let rebuilt = HashChainKem::keypair_from_secret(keypair.secret_key.as_bytes()).unwrap();
        assert_eq!(rebuilt.public_key, keypair.public_key);
    }

    #[test]
    fn test_keypair_from_short_secret_rejected() {
        assert!(matches!(
            HashChainKem::keypair_from_secret(&[0u8; 31]),
            Err(CryptoError::InvalidSecretKey)
        ));
    }
}

#[cfg(test)]
mod decapsulation_tests {
    use super::*;

    #[test]
    fn test_mismatched_keypair_fails_with_invalid_ciphertext() {
        for algorithm in ALGORITHMS {
            let kem = kem_for(algorithm);
            let alice = kem.generate_keypair().unwrap();
            let mallory = kem.generate_keypair().unwrap();

            let encapsulation = kem.encapsulate(&alice.public_key).unwrap();
            let err = kem
                .decapsulate(&encapsulation.ciphertext, &mallory.secret_key)
                .unwrap_err();
            assert!(matches!(err, CryptoError::InvalidCiphertext), "{}", algorithm);
            assert!(err.is_verification_failure());
        }
    }

    #[test]
    fn test_flipped_ciphertext_byte_rejected() {
        for algorithm in ALGORITHMS {
            let kem = kem_for(algorithm);
            let keypair = kem.generate_keypair().unwrap();
            let encapsulation = kem.encapsulate(&keypair.public_key).unwrap();

            let mut bytes = encapsulation.ciphertext.as_bytes().to_vec();
            let last = bytes.len() - 1;
            bytes[last] ^= 0x80;

            let result = kem.decapsulate(&KemCiphertext::from_bytes(&bytes), &keypair.secret_key);
            assert!(matches!(result, Err(CryptoError::InvalidCiphertext)), "{}", algorithm);
        }
    }

    #[test]
    fn test_validate_keypair() {
        for algorithm in ALGORITHMS {
            let kem = kem_for(algorithm);
            let a = kem.generate_keypair().unwrap();
            let b = kem.generate_keypair().unwrap();
            assert!(kem.validate_keypair(&a).is_ok());

            let mixed = KeyPair {
                public_key: a.public_key.clone(),
                secret_key: b.secret_key.clone(),
            };
            assert!(kem.validate_keypair(&mixed).is_err());
        }
    }

    #[test]
    fn test_cross_algorithm_keys_rejected() {
        let hash_chain = kem_for(KemAlgorithm::HashChain);
        let kyber = kem_for(KemAlgorithm::MlKem768);
        let small = hash_chain.generate_keypair().unwrap();

        let err = kyber.encapsulate(&small.public_key).unwrap_err();
        assert!(err.is_key_material());
    }
}
