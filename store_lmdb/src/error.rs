use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("missing commit {0}")]
    MissingCommit(String),
}

impl From<LmdbError> for civitas_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::MissingCommit(id) => {
                civitas_store::StoreError::Corruption(format!("head points at missing commit {id}"))
            }
            other => civitas_store::StoreError::Backend(other.to_string()),
        }
    }
}
