//! Proposal policy: an approval poll per pull request, with a bounty paid to
//! reviewers who supported an approved proposal.

use crate::error::PolicyError;
use crate::notice::Notices;
use crate::policy::{
    ensure_type, load_state, motion_ballot_ns, open_single_choice_ballot, refresh_attention,
    show_with_ballot, write_breakdown, write_refunds, write_rewards, MotionPolicy, PolicyEnv,
    PolicyView,
};
use civitas_ballot::{Outcome, QvState, PROPOSAL_APPROVAL_KERNEL};
use civitas_motion::{Motion, MotionType};
use civitas_store::Tree;
use civitas_types::{Credits, MotionId, Ns};

pub const PROPOSAL_POLICY: &str = "pmp-proposal-v1";
pub const APPROVE_CHOICE: &str = "approve";

#[derive(Clone, Copy, Debug)]
pub struct ProposalPolicy {
    pub inverse_cost_multiplier: f64,
    pub bounty: Credits,
}

impl ProposalPolicy {
    fn close_notice(&self, motion: &Motion, outcome: &Outcome) -> String {
        let mut w = String::new();
        let verdict = if outcome.winner.is_some() { "approved" } else { "not approved" };
        w.push_str(&format!(
            "This PR, managed as proposal `{}`, has been closed ({verdict}).\n\n",
            motion.id
        ));
        w.push_str(&format!("The PR approval tally was {}.\n\n", approval(outcome)));
        write_rewards(&mut w, outcome);
        write_refunds(&mut w, outcome);
        write_breakdown(&mut w, outcome, APPROVE_CHOICE);
        w
    }

    fn cancel_notice(&self, motion: &Motion, outcome: &Outcome) -> String {
        let mut w = String::new();
        w.push_str(&format!(
            "This unmerged PR, managed as proposal `{}`, has been cancelled.\n\n",
            motion.id
        ));
        w.push_str(&format!("The PR approval tally was {}.\n\n", approval(outcome)));
        write_refunds(&mut w, outcome);
        write_breakdown(&mut w, outcome, APPROVE_CHOICE);
        w
    }
}

fn approval(outcome: &Outcome) -> f64 {
    outcome.scores.get(APPROVE_CHOICE).copied().unwrap_or(0.0)
}

impl MotionPolicy for ProposalPolicy {
    fn name(&self) -> &str {
        PROPOSAL_POLICY
    }

    fn ballot_id(&self, motion: &MotionId) -> Result<Ns, PolicyError> {
        motion_ballot_ns(motion, "approval")
    }

    fn open(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError> {
        ensure_type(self.name(), motion, MotionType::Proposal)?;
        open_single_choice_ballot(
            tree,
            env,
            motion,
            self.ballot_id(&motion.id)?,
            APPROVE_CHOICE,
            PROPOSAL_APPROVAL_KERNEL,
            QvState::new(self.inverse_cost_multiplier)
                .with_bounty(self.bounty)
                .for_motion(motion.id.clone()),
        )?;
        Ok(Notices::one(format!(
            "This PR is managed as proposal `{}`. Vote on {APPROVE_CHOICE:?} to approve it.",
            motion.id
        )))
    }

    fn show(&self, tree: &Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<PolicyView, PolicyError> {
        show_with_ballot(tree, env, motion)
    }

    fn process(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError> {
        let state = load_state(tree, &motion.id)?;
        refresh_attention(tree, env, motion, &state.ballot, APPROVE_CHOICE)?;
        Ok(Notices::none())
    }

    fn on_ballot_outcome(
        &self,
        tree: &mut Tree,
        _env: &PolicyEnv<'_>,
        motion: &Motion,
        outcome: &Outcome,
    ) -> Result<Notices, PolicyError> {
        if outcome.cancelled {
            return Ok(Notices::one(self.cancel_notice(motion, outcome)));
        }
        for (user, amount) in &outcome.rewarded {
            civitas_groups::deposit(tree, user, *amount)?;
        }
        tracing::info!(
            motion = %motion.id,
            approved = outcome.winner.is_some(),
            rewarded = outcome.total_rewarded(),
            "proposal outcome applied"
        );
        Ok(Notices::one(self.close_notice(motion, outcome)))
    }
}
