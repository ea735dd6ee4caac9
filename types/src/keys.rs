//! Raw Ed25519 key bytes of a community identity.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Verifying key published with the community's public credentials.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Secret seed kept on the private branch.
///
/// Deliberately neither `Debug`, `Clone` nor `Serialize`; the bytes are
/// wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

impl PrivateKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}
