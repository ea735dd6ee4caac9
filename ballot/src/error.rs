use civitas_groups::GroupError;
use civitas_store::StoreError;
use civitas_types::{Credits, Ns, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BallotError {
    #[error("ballot {0} already exists")]
    AlreadyExists(Ns),

    #[error("ballot {0} not found")]
    NotFound(Ns),

    #[error("ballot {0} is closed")]
    Closed(Ns),

    #[error("ballot {0} is cancelled")]
    Cancelled(Ns),

    #[error("ballot {0} is frozen")]
    Frozen(Ns),

    #[error("ballot {0} is not frozen")]
    NotFrozen(Ns),

    #[error("invalid ballot definition: {0}")]
    InvalidAd(String),

    #[error("{user} is not a member of {group}")]
    NotMember { user: String, group: String },

    #[error("choice {choice:?} is not on ballot {ballot}")]
    UnknownChoice { ballot: Ns, choice: String },

    #[error("vote strength must be finite, got {0}")]
    InvalidStrength(f64),

    #[error("unknown score kernel {0}")]
    UnknownKernel(String),

    #[error("score kernel {0} is already registered")]
    DuplicateKernel(String),

    #[error("invalid state for kernel {kernel}: {reason}")]
    InvalidKernelState { kernel: String, reason: String },

    #[error("{user} has already voted and kernel {kernel} does not allow revision")]
    RevisionNotAllowed { user: String, kernel: String },

    #[error("{user} needs {needed} credits but has {balance}")]
    InsufficientCredits {
        user: String,
        balance: Credits,
        needed: Credits,
    },

    #[error(transparent)]
    Groups(#[from] GroupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Types(#[from] TypesError),
}
