use crate::motion::MotionState;
use civitas_store::StoreError;
use civitas_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("motion {0} already exists")]
    AlreadyExists(String),

    #[error("motion {0} not found")]
    NotFound(String),

    #[error("motion {id} is already {state}")]
    AlreadyTerminal { id: String, state: MotionState },

    #[error("motion {0} is neither closed nor cancelled")]
    NotTerminal(String),

    #[error("motion {id} cannot {action} while {state}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        state: MotionState,
    },

    #[error("unknown motion type {0:?}")]
    UnknownType(String),

    #[error("invalid reference type {0:?}")]
    InvalidRefType(String),

    #[error("motion {0} cannot reference itself")]
    SelfReference(String),

    #[error("attention score must be finite, got {0}")]
    InvalidAttention(f64),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
