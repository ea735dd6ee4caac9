//! Versioned tree store boundary for civitas.
//!
//! Governance state lives in branches of an append-only, content-addressed
//! store. Every backend (LMDB, in-memory for testing) implements [`Remote`];
//! the rest of the workspace only works with [`Cloned`] working trees.
//!
//! A clone is taken, mutated locally, committed only if something changed,
//! and pushed. A push that is not a fast-forward of the remote branch fails
//! with [`StoreError::Conflict`] and leaves the remote untouched.

pub mod cloned;
pub mod commit;
pub mod error;
pub mod layout;
pub mod remote;
pub mod tree;

pub use cloned::{commit_if_changed, commit_message, Change, Cloned, Commitable, Status};
pub use commit::{Commit, CommitId, Snapshot};
pub use error::StoreError;
pub use remote::{conflict, validate_chain, Remote};
pub use tree::Tree;
