//! LMDB storage backend for the civitas versioned store.
//!
//! Implements [`civitas_store::Remote`] using the `heed` LMDB bindings. A single
//! environment holds every branch of a community: commits keyed by id and one
//! head pointer per branch.

pub mod error;
pub mod remote;

pub use error::LmdbError;
pub use remote::LmdbRemote;
