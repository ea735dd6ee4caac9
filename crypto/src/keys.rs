//! Ed25519 identity keys.

use civitas_types::{KeyPair, PrivateKey, PublicKey};
use ed25519_dalek::SigningKey;

/// Deterministic key pair for `seed`.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let signing = SigningKey::from_bytes(seed);
    KeyPair {
        public: PublicKey(signing.verifying_key().to_bytes()),
        private: PrivateKey(signing.to_bytes()),
    }
}

/// Whether `public` is the verifying key of `private`.
pub fn is_matching_pair(private: &PrivateKey, public: &PublicKey) -> bool {
    SigningKey::from_bytes(private.as_bytes()).verifying_key().as_bytes() == public.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_identity() {
        let a = keypair_from_seed(&[7u8; 32]);
        let b = keypair_from_seed(&[7u8; 32]);
        assert_eq!(a.public, b.public);
        assert_ne!(a.public, keypair_from_seed(&[8u8; 32]).public);
    }

    #[test]
    fn detects_mismatched_pairs() {
        let a = keypair_from_seed(&[1u8; 32]);
        let b = keypair_from_seed(&[2u8; 32]);
        assert!(is_matching_pair(&a.private, &a.public));
        assert!(!is_matching_pair(&a.private, &b.public));
    }
}
