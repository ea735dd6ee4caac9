use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("serialization error at {path}: {reason}")]
    Serialization { path: String, reason: String },

    /// The push was not a fast-forward of the remote branch.
    #[error("push to {branch} rejected: expected head {expected}, remote is at {actual}")]
    Conflict {
        branch: String,
        expected: String,
        actual: String,
    },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("store is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
