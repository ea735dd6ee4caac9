use civitas_ballot::BallotError;
use civitas_crypto::CryptoError;
use civitas_groups::GroupError;
use civitas_motion::MotionError;
use civitas_policy::PolicyError;
use civitas_store::StoreError;
use civitas_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("push to {branch} still conflicting after {attempts} attempts")]
    ConflictRetriesExhausted { branch: String, attempts: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Ballot(#[from] BallotError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Groups(#[from] GroupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

/// Coarse classification of a [`GovError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input; nothing was committed.
    Validation,
    /// Lost a push race; retryable until the retry budget is spent.
    Conflict,
    /// Existing state forbids the operation; nothing was written.
    Precondition,
    /// Unregistered or misconfigured score kernel.
    Kernel,
    /// The store itself failed.
    Backend,
}

impl GovError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovError::Precondition(_) => ErrorKind::Precondition,
            GovError::ConflictRetriesExhausted { .. } => ErrorKind::Conflict,
            GovError::Config(_) | GovError::Crypto(_) | GovError::Types(_) => ErrorKind::Validation,
            GovError::Store(e) => store_kind(e),
            GovError::Ballot(e) => ballot_kind(e),
            GovError::Motion(MotionError::Store(e)) => store_kind(e),
            GovError::Motion(_) => ErrorKind::Validation,
            GovError::Groups(GroupError::Store(e)) => store_kind(e),
            GovError::Groups(_) => ErrorKind::Validation,
            GovError::Policy(e) => policy_kind(e),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

fn store_kind(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::Conflict { .. } => ErrorKind::Conflict,
        StoreError::Backend(_) | StoreError::Corruption(_) => ErrorKind::Backend,
        StoreError::NotFound(_) | StoreError::InvalidPath(_) | StoreError::Serialization { .. } => {
            ErrorKind::Validation
        }
    }
}

fn ballot_kind(e: &BallotError) -> ErrorKind {
    match e {
        BallotError::UnknownKernel(_)
        | BallotError::DuplicateKernel(_)
        | BallotError::InvalidKernelState { .. } => ErrorKind::Kernel,
        BallotError::Store(e) | BallotError::Groups(GroupError::Store(e)) => store_kind(e),
        _ => ErrorKind::Validation,
    }
}

fn policy_kind(e: &PolicyError) -> ErrorKind {
    match e {
        PolicyError::Ballot(e) => ballot_kind(e),
        PolicyError::Store(e)
        | PolicyError::Motion(MotionError::Store(e))
        | PolicyError::Groups(GroupError::Store(e)) => store_kind(e),
        _ => ErrorKind::Validation,
    }
}
