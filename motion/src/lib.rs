//! Motions: tracked concerns and proposals.
//!
//! A motion has an immutable identity (id, type, policy, author), mutable
//! metadata, lifecycle flags driven by a small state machine, an attention
//! score used for ranking, and typed references to other motions. References
//! are stored on both ends (`ref_to` on the source, `ref_by` on the target)
//! and [`MotionStore`] keeps the two sides in step.

pub mod error;
pub mod motion;
pub mod refs;
pub mod store;

pub use error::MotionError;
pub use motion::{Motion, MotionMeta, MotionState, MotionType, NewMotion, Score};
pub use refs::{Ref, RefType, Refs};
pub use store::{ranked_by_attention, sort_by_id, MotionStore};
