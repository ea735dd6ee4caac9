use civitas_store::StoreError;
use civitas_types::{Credits, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("user {0} already exists")]
    UserExists(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("group {0} not found")]
    GroupNotFound(String),

    #[error("users cannot be removed from the everybody group")]
    CannotLeaveEverybody,

    #[error("invalid property key {0:?}")]
    InvalidPropertyKey(String),

    #[error("property {key} of {user} is already set")]
    PropertyExists { user: String, key: String },

    #[error("invalid credit amount {0}")]
    InvalidAmount(Credits),

    #[error("{user} has {balance} credits, needs {requested}")]
    InsufficientCredits {
        user: String,
        balance: Credits,
        requested: Credits,
    },

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
