//! Ballots for civitas governance.
//!
//! A ballot lives in a namespace of the community tree. Its definition (the
//! [`Ad`]) names the choices, the participant group and a score kernel. Voters
//! advance credits as they vote; the kernel turns accepted elections into
//! scored contributions, and the [`TallyEngine`] aggregates those into a
//! [`Tally`] while the ballot is open and an [`Outcome`] once it closes or is
//! cancelled.
//!
//! Scoring and tallying are pure: no clock, no randomness, no I/O. Only
//! [`BallotStore`] touches the tree.

pub mod ad;
pub mod error;
pub mod kernel;
pub mod store;
pub mod tally;

pub use ad::{AcceptedElections, Ad, Election, VoterRecord};
pub use error::BallotError;
pub use kernel::{
    BuiltinKernel, KernelRegistry, Margin, MarginCalculator, ProposalApprovalKernel, QvKernel,
    QvState, ScoreKernel, ScoredVotes, PROPOSAL_APPROVAL_KERNEL, QV_KERNEL,
};
pub use store::{BallotStore, BallotView};
pub use tally::{Outcome, StrengthAndScore, Tally, TallyEngine};

#[cfg(test)]
pub(crate) mod testutil;
