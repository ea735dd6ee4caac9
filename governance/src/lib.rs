//! Governance orchestration for civitas.
//!
//! The [`GovernanceOrchestrator`] is the single entry point for state-changing
//! operations. Each operation runs as one transaction: clone the community
//! branch, stage every write in the working tree, commit only if something
//! changed, and push. A push that loses a race is retried on a fresh clone a
//! bounded number of times. Notices produced by policies are delivered only
//! once the transaction is pushed.

pub mod boot;
pub mod config;
pub mod error;
pub mod members;
pub mod motions;
pub mod orchestrator;

pub use config::GovConfig;
pub use error::{ErrorKind, GovError};
pub use motions::{ListMotions, MotionView};
pub use orchestrator::{GovernanceOrchestrator, Txn, STAT_NAMES};
