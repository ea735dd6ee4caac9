//! Motion lifecycle operations.
//!
//! Closing or cancelling a motion runs the whole chain in one transaction:
//! resolve the motion's policy, close or cancel its ballot (scoring through
//! the ballot's kernel), transition the motion, then hand the outcome to the
//! policy. Any failure along the way leaves the branch untouched.

use crate::error::GovError;
use crate::orchestrator::{GovernanceOrchestrator, Txn};
use civitas_ballot::{Outcome, VoterRecord};
use civitas_motion::{
    ranked_by_attention, Motion, MotionError, MotionMeta, MotionStore, NewMotion, Ref,
};
use civitas_policy::{MotionPolicy, PolicyView};
use civitas_types::{MotionId, User};
use serde::Serialize;

/// A motion together with its policy's view of it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionView {
    pub motion: Motion,
    pub policy: PolicyView,
}

/// Listing options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListMotions {
    /// Skip closed, cancelled and archived motions.
    pub open_only: bool,
    /// Order by ascending attention instead of by id.
    pub by_attention: bool,
}

fn ensure_open(motion: &Motion) -> Result<(), MotionError> {
    if !motion.is_open() {
        return Err(MotionError::AlreadyTerminal {
            id: motion.id.to_string(),
            state: motion.state(),
        });
    }
    Ok(())
}

impl GovernanceOrchestrator {
    /// Create a motion and let its policy open the motion's ballot.
    pub fn open_motion(&self, spec: NewMotion) -> Result<Motion, GovError> {
        let summary = format!("open {} {}", spec.motion_type, spec.id);
        self.transact(&summary, |txn| {
            let policy = self.policies().get(&spec.policy)?;
            let now = txn.now();
            let motion = MotionStore.open_motion(txn.tree, spec.clone(), now)?;
            let notices = policy.open(txn.tree, &txn.env, &motion)?;
            txn.notify(&motion.id, notices);
            Ok(MotionStore.get(txn.tree, &motion.id)?)
        })
    }

    pub fn show_motion(&self, id: &MotionId) -> Result<MotionView, GovError> {
        self.read(|tree, env| {
            let motion = MotionStore.get(tree, id)?;
            let policy = self.policy_for(&motion)?.show(tree, env, &motion)?;
            Ok(MotionView { motion, policy })
        })
    }

    pub fn list_motions(&self, opts: ListMotions) -> Result<Vec<Motion>, GovError> {
        self.read(|tree, _| {
            let mut motions = if opts.open_only {
                MotionStore.list_open(tree)?
            } else {
                MotionStore.list(tree)?
            };
            if opts.by_attention {
                ranked_by_attention(&mut motions);
            }
            Ok(motions)
        })
    }

    /// Cast `voter`'s strength on `choice` in the motion's ballot.
    pub fn vote(&self, id: &MotionId, voter: &User, choice: &str, strength: f64) -> Result<VoterRecord, GovError> {
        self.transact(&format!("vote on motion {id} by {voter}"), |txn| {
            let motion = MotionStore.get(txn.tree, id)?;
            ensure_open(&motion)?;
            let ballot = self.policy_for(&motion)?.ballot_id(&motion.id)?;
            let now = txn.now();
            Ok(txn
                .ballots()
                .cast_vote(txn.tree, &ballot, voter, choice, strength, now)?)
        })
    }

    /// Run every open motion's periodic policy processing. Returns the
    /// number of motions processed.
    pub fn process_motions(&self) -> Result<usize, GovError> {
        self.transact("process motions", |txn| {
            let motions = MotionStore.list_open(txn.tree)?;
            for motion in &motions {
                let notices = self.policy_for(motion)?.process(txn.tree, &txn.env, motion)?;
                txn.notify(&motion.id, notices);
            }
            Ok(motions.len())
        })
    }

    pub fn close_motion(&self, id: &MotionId) -> Result<Outcome, GovError> {
        self.transact(&format!("close motion {id}"), |txn| self.finish_motion(txn, id, false))
    }

    pub fn cancel_motion(&self, id: &MotionId) -> Result<Outcome, GovError> {
        self.transact(&format!("cancel motion {id}"), |txn| self.finish_motion(txn, id, true))
    }

    fn finish_motion(&self, txn: &mut Txn<'_>, id: &MotionId, cancel: bool) -> Result<Outcome, GovError> {
        let motion = MotionStore.get(txn.tree, id)?;
        ensure_open(&motion)?;
        let policy = self.policy_for(&motion)?;
        let ballot = policy.ballot_id(&motion.id)?;
        let outcome = if cancel {
            txn.ballots().cancel(txn.tree, &ballot)?
        } else {
            txn.ballots().close(txn.tree, &ballot)?
        };
        let now = txn.now();
        let motion = MotionStore.update(txn.tree, id, |m| if cancel { m.cancel(now) } else { m.close(now) })?;
        let notices = policy.on_ballot_outcome(txn.tree, &txn.env, &motion, &outcome)?;
        txn.notify(&motion.id, notices);
        tracing::info!(
            motion = %motion.id,
            state = %motion.state(),
            winner = outcome.winner.as_deref().unwrap_or("<none>"),
            "motion finished"
        );
        Ok(outcome)
    }

    /// Freeze a motion and its ballot; votes are rejected until unfrozen.
    pub fn freeze_motion(&self, id: &MotionId) -> Result<Motion, GovError> {
        self.transact(&format!("freeze motion {id}"), |txn| {
            let motion = MotionStore.update(txn.tree, id, Motion::freeze)?;
            let ballot = self.policy_for(&motion)?.ballot_id(&motion.id)?;
            txn.ballots().freeze(txn.tree, &ballot)?;
            Ok(motion)
        })
    }

    pub fn unfreeze_motion(&self, id: &MotionId) -> Result<Motion, GovError> {
        self.transact(&format!("unfreeze motion {id}"), |txn| {
            let motion = MotionStore.update(txn.tree, id, Motion::unfreeze)?;
            let ballot = self.policy_for(&motion)?.ballot_id(&motion.id)?;
            txn.ballots().unfreeze(txn.tree, &ballot)?;
            Ok(motion)
        })
    }

    pub fn archive_motion(&self, id: &MotionId) -> Result<Motion, GovError> {
        self.transact(&format!("archive motion {id}"), |txn| {
            Ok(MotionStore.update(txn.tree, id, Motion::archive)?)
        })
    }

    /// Add a reference; returns whether anything changed.
    pub fn add_ref(&self, r: &Ref) -> Result<bool, GovError> {
        self.transact(&format!("add reference {r}"), |txn| Ok(MotionStore.add_ref(txn.tree, r)?))
    }

    pub fn remove_ref(&self, r: &Ref) -> Result<bool, GovError> {
        self.transact(&format!("remove reference {r}"), |txn| {
            Ok(MotionStore.remove_ref(txn.tree, r)?)
        })
    }

    pub fn update_motion_meta(&self, id: &MotionId, meta: MotionMeta) -> Result<Motion, GovError> {
        self.transact(&format!("update motion {id}"), |txn| {
            Ok(MotionStore.update_meta(txn.tree, id, meta.clone())?)
        })
    }
}
