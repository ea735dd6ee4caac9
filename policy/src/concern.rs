//! Concern policy: a quadratic-voting priority poll per concern.

use crate::error::PolicyError;
use crate::notice::Notices;
use crate::policy::{
    ensure_type, load_state, motion_ballot_ns, open_single_choice_ballot, refresh_attention,
    show_with_ballot, write_breakdown, write_refunds, MotionPolicy, PolicyEnv, PolicyView,
};
use civitas_ballot::{Outcome, QvState, QV_KERNEL};
use civitas_motion::{Motion, MotionType};
use civitas_store::Tree;
use civitas_types::{MotionId, Ns};

pub const CONCERN_POLICY: &str = "pmp-concern-v1";
pub const PRIORITIZE_CHOICE: &str = "prioritize";

#[derive(Clone, Copy, Debug)]
pub struct ConcernPolicy {
    pub inverse_cost_multiplier: f64,
}

impl MotionPolicy for ConcernPolicy {
    fn name(&self) -> &str {
        CONCERN_POLICY
    }

    fn ballot_id(&self, motion: &MotionId) -> Result<Ns, PolicyError> {
        motion_ballot_ns(motion, "priority")
    }

    fn open(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError> {
        ensure_type(self.name(), motion, MotionType::Concern)?;
        open_single_choice_ballot(
            tree,
            env,
            motion,
            self.ballot_id(&motion.id)?,
            PRIORITIZE_CHOICE,
            QV_KERNEL,
            QvState::new(self.inverse_cost_multiplier).for_motion(motion.id.clone()),
        )?;
        Ok(Notices::one(format!(
            "This issue is managed as concern `{}`. Vote on {PRIORITIZE_CHOICE:?} to raise its priority.",
            motion.id
        )))
    }

    fn show(&self, tree: &Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<PolicyView, PolicyError> {
        show_with_ballot(tree, env, motion)
    }

    fn process(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError> {
        let state = load_state(tree, &motion.id)?;
        refresh_attention(tree, env, motion, &state.ballot, PRIORITIZE_CHOICE)?;
        Ok(Notices::none())
    }

    fn on_ballot_outcome(
        &self,
        _tree: &mut Tree,
        _env: &PolicyEnv<'_>,
        motion: &Motion,
        outcome: &Outcome,
    ) -> Result<Notices, PolicyError> {
        let mut w = String::new();
        let verb = if outcome.cancelled { "cancelled" } else { "closed" };
        w.push_str(&format!(
            "This issue, managed as concern `{}`, has been {verb}.\n\n",
            motion.id
        ));
        let score = outcome.scores.get(PRIORITIZE_CHOICE).copied().unwrap_or(0.0);
        w.push_str(&format!("The priority tally was {score}.\n\n"));
        write_refunds(&mut w, outcome);
        write_breakdown(&mut w, outcome, PRIORITIZE_CHOICE);
        Ok(Notices::one(w))
    }
}
