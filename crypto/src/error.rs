use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("hex decoding failed: {0}")]
    Hex(#[from] hex::FromHexError),
}
