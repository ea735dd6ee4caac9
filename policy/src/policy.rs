//! The policy capability contract and the helpers shared by built-in policies.

use crate::error::PolicyError;
use crate::notice::Notices;
use civitas_ballot::{Ad, BallotStore, BallotView, KernelRegistry, Outcome, QvState};
use civitas_motion::{Motion, MotionStore, MotionType};
use civitas_store::{layout, Tree};
use civitas_types::{Credits, Group, KernelName, MotionId, Ns, PolicyName, Timestamp};
use serde::{Deserialize, Serialize};

/// What a policy may consult besides the tree.
#[derive(Clone, Copy)]
pub struct PolicyEnv<'a> {
    pub kernels: &'a KernelRegistry,
    pub now: Timestamp,
}

impl<'a> PolicyEnv<'a> {
    pub fn new(kernels: &'a KernelRegistry, now: Timestamp) -> Self {
        Self { kernels, now }
    }

    pub fn ballots(&self) -> BallotStore<'a> {
        BallotStore::new(self.kernels)
    }
}

/// Per-motion policy bookkeeping at `policy/<motion-id>/state.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyState {
    pub policy: PolicyName,
    pub ballot: Ns,
    pub kernel: KernelName,
    #[serde(default)]
    pub bounty: Credits,
}

/// Read-only projection of a motion under its policy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolicyView {
    pub state: PolicyState,
    pub ballot: BallotView,
}

/// Behavior bound to a motion type.
pub trait MotionPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Namespace of the ballot this policy runs for `motion`.
    fn ballot_id(&self, motion: &MotionId) -> Result<Ns, PolicyError>;

    /// Set up policy state and the motion's ballot.
    fn open(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError>;

    /// Read-only view; never mutates the tree.
    fn show(&self, tree: &Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<PolicyView, PolicyError>;

    /// Periodic processing, e.g. refreshing tallies and attention.
    fn process(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError>;

    /// Side effects of a closed or cancelled ballot. Called exactly once per
    /// outcome, after the motion's state transition.
    fn on_ballot_outcome(
        &self,
        tree: &mut Tree,
        env: &PolicyEnv<'_>,
        motion: &Motion,
        outcome: &Outcome,
    ) -> Result<Notices, PolicyError>;
}

pub(crate) fn motion_ballot_ns(id: &MotionId, purpose: &str) -> Result<Ns, PolicyError> {
    Ok(Ns::from_segments([layout::MOTION_DIR, id.as_str(), purpose])?)
}

pub(crate) fn ensure_type(policy: &str, motion: &Motion, expected: MotionType) -> Result<(), PolicyError> {
    if motion.motion_type != expected {
        return Err(PolicyError::WrongMotionType {
            policy: policy.to_string(),
            motion_type: motion.motion_type,
        });
    }
    Ok(())
}

/// Write the policy state and open a single-choice ballot for `motion`.
pub(crate) fn open_single_choice_ballot(
    tree: &mut Tree,
    env: &PolicyEnv<'_>,
    motion: &Motion,
    ballot: Ns,
    choice: &str,
    kernel: &str,
    state: QvState,
) -> Result<Ad, PolicyError> {
    let record = PolicyState {
        policy: motion.policy.clone(),
        ballot: ballot.clone(),
        kernel: KernelName::new(kernel),
        bounty: state.bounty.unwrap_or(0.0),
    };
    let ad = Ad {
        id: ballot,
        title: format!("{} {}: {}", motion.motion_type, motion.id, motion.title),
        description: motion.body.clone(),
        choices: vec![choice.to_string()],
        kernel: record.kernel.clone(),
        participants: Group::everybody(),
        kernel_state: state.to_value()?,
        frozen: false,
        closed: false,
        cancelled: false,
        created_at: env.now,
    };
    let ad = env.ballots().open(tree, ad)?;
    tree.write_json(&layout::policy_state(&motion.id), &record)?;
    Ok(ad)
}

pub(crate) fn load_state(tree: &Tree, motion: &MotionId) -> Result<PolicyState, PolicyError> {
    Ok(tree.read_json(&layout::policy_state(motion))?)
}

pub(crate) fn show_with_ballot(tree: &Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<PolicyView, PolicyError> {
    let state = load_state(tree, &motion.id)?;
    let ballot = env.ballots().show(tree, &state.ballot)?;
    Ok(PolicyView { state, ballot })
}

/// Refresh the tally of an open motion's ballot and copy the score of
/// `choice` into the motion's attention.
pub(crate) fn refresh_attention(
    tree: &mut Tree,
    env: &PolicyEnv<'_>,
    motion: &Motion,
    ballot: &Ns,
    choice: &str,
) -> Result<(), PolicyError> {
    if !motion.is_open() {
        return Ok(());
    }
    let tally = env.ballots().tally(tree, ballot)?;
    let attention = tally.scores.get(choice).copied().unwrap_or(0.0);
    MotionStore.set_attention(tree, &motion.id, attention)?;
    Ok(())
}

pub(crate) fn write_refunds(w: &mut String, outcome: &Outcome) {
    w.push_str("Refunds issued:\n");
    for (user, amount) in &outcome.refunded {
        w.push_str(&format!("- User {user} was refunded {amount} credits.\n"));
    }
    for (user, amount) in &outcome.forfeited {
        w.push_str(&format!("- User {user} is no longer registered; {amount} credits were forfeited.\n"));
    }
    w.push('\n');
}

pub(crate) fn write_rewards(w: &mut String, outcome: &Outcome) {
    w.push_str("Rewards issued:\n");
    for (user, amount) in &outcome.rewarded {
        w.push_str(&format!("- User {user} was rewarded {amount} credits.\n"));
    }
    w.push('\n');
}

pub(crate) fn write_breakdown(w: &mut String, outcome: &Outcome, choice: &str) {
    w.push_str("Tally breakdown by user:\n");
    for (user, per_choice) in &outcome.scores_by_user {
        let votes = per_choice.get(choice).map(|s| s.score).unwrap_or(0.0);
        w.push_str(&format!("- User {user} contributed {votes} votes.\n"));
    }
}
