//! Cryptographic primitives for civitas.
//!
//! - **Blake2b** for content-addressing commits in the versioned store
//! - **Ed25519** key derivation for the identity collaborator
//!
//! The governance core never mints credentials itself; it only consumes
//! whatever an [`IdentityProvider`] hands it.

pub mod credentials;
pub mod error;
pub mod hash;
pub mod keys;

pub use credentials::{IdentityProvider, PrivateCredentials, PublicCredentials, SeededIdentity};
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, content_id};
pub use keys::{is_matching_pair, keypair_from_seed};
