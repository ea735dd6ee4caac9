//! Credential material supplied by the identity collaborator.
//!
//! Public credentials are published on the community branch; private
//! credentials go to a separate private branch. Both are plain serde records.

use crate::error::CryptoError;
use crate::hash::{blake2b_256, content_id};
use crate::keys::{is_matching_pair, keypair_from_seed};
use civitas_types::{PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};

/// Publicly visible identity of a community owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCredentials {
    /// Content id of the public key.
    pub id: String,
    /// Hex-encoded Ed25519 public key.
    pub public_key_ed25519: String,
}

/// Private half of an identity. Never written to a public branch.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateCredentials {
    /// Hex-encoded Ed25519 private seed.
    pub private_key_ed25519: String,
    pub public_credentials: PublicCredentials,
}

impl std::fmt::Debug for PrivateCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateCredentials")
            .field("public_credentials", &self.public_credentials)
            .finish_non_exhaustive()
    }
}

impl PrivateCredentials {
    /// Build credentials from raw Ed25519 key bytes.
    pub fn from_key_bytes(public: &[u8; 32], private: &[u8; 32]) -> Self {
        Self {
            private_key_ed25519: hex::encode(private),
            public_credentials: PublicCredentials {
                id: content_id(&[b"ed25519".as_slice(), public.as_slice()]),
                public_key_ed25519: hex::encode(public),
            },
        }
    }

    /// Check that the stored public key matches the private seed.
    pub fn verify(&self) -> Result<(), CryptoError> {
        let private = PrivateKey(decode_key(&self.private_key_ed25519)?);
        let public = PublicKey(decode_key(&self.public_credentials.public_key_ed25519)?);
        if !is_matching_pair(&private, &public) {
            return Err(CryptoError::InvalidKey(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(())
    }
}

fn decode_key(hex_key: &str) -> Result<[u8; 32], CryptoError> {
    let raw = hex::decode(hex_key)?;
    raw.as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(format!("expected 32 bytes, got {}", raw.len())))
}

/// Supplier of credential material used when establishing an authenticated clone.
pub trait IdentityProvider: Send + Sync {
    fn credentials(&self) -> Result<PrivateCredentials, CryptoError>;
}

/// Deterministic identity derived from a secret passphrase.
pub struct SeededIdentity {
    seed: [u8; 32],
}

impl SeededIdentity {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    pub fn from_passphrase(passphrase: &str) -> Self {
        Self {
            seed: blake2b_256(passphrase.as_bytes()),
        }
    }
}

impl IdentityProvider for SeededIdentity {
    fn credentials(&self) -> Result<PrivateCredentials, CryptoError> {
        let kp = keypair_from_seed(&self.seed);
        Ok(PrivateCredentials::from_key_bytes(
            kp.public.as_bytes(),
            kp.private.as_bytes(),
        ))
    }
}
