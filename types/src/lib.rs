//! Fundamental types for civitas governance.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! community identifiers, namespaces, timestamps, clocks, and key material.

pub mod error;
pub mod ids;
pub mod keys;
pub mod ns;
pub mod time;

pub use error::TypesError;
pub use ids::{Group, KernelName, MotionId, PolicyName, User};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use ns::Ns;
pub use time::{Clock, SystemClock, Timestamp};

/// Voting credits. Quadratic costs are fractional, so credits are real-valued.
pub type Credits = f64;
