//! Motion policies.
//!
//! A policy binds behavior to a kind of motion: which ballot it runs, how the
//! motion is displayed, what periodic processing does, and which side effects
//! (rewards, notices) follow a ballot outcome. The set of policies is closed
//! ([`BuiltinPolicy`]) and resolved by name through a [`PolicyRegistry`] that
//! is built once at startup and shared read-only.

pub mod concern;
pub mod error;
pub mod notice;
pub mod policy;
pub mod proposal;
pub mod registry;

pub use concern::{ConcernPolicy, CONCERN_POLICY, PRIORITIZE_CHOICE};
pub use error::PolicyError;
pub use notice::{CollectingSink, Notice, NoticeSink, Notices, TracingSink};
pub use policy::{MotionPolicy, PolicyEnv, PolicyState, PolicyView};
pub use proposal::{ProposalPolicy, APPROVE_CHOICE, PROPOSAL_POLICY};
pub use registry::{default_policy_for, BuiltinPolicy, PolicyConfig, PolicyRegistry};
