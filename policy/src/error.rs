use civitas_ballot::BallotError;
use civitas_groups::GroupError;
use civitas_motion::{MotionError, MotionType};
use civitas_store::StoreError;
use civitas_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unknown motion policy {0}")]
    UnknownPolicy(String),

    #[error("motion policy {0} is already registered")]
    DuplicatePolicy(String),

    #[error("policy {policy} does not govern {motion_type} motions")]
    WrongMotionType {
        policy: String,
        motion_type: MotionType,
    },

    #[error(transparent)]
    Ballot(#[from] BallotError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Groups(#[from] GroupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Types(#[from] TypesError),
}
