//! Ballot persistence and lifecycle on a working tree.

use crate::ad::{AcceptedElections, Ad, Election, VoterRecord};
use crate::error::BallotError;
use crate::kernel::{KernelRegistry, ScoreKernel};
use crate::tally::{Outcome, Tally, TallyEngine};
use civitas_groups::GroupError;
use civitas_store::{layout, Tree};
use civitas_types::{Credits, Ns, Timestamp, User};
use serde::Serialize;
use std::collections::BTreeMap;

/// Read-only projection of a ballot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BallotView {
    pub ad: Ad,
    pub tally: Option<Tally>,
    pub outcome: Option<Outcome>,
}

/// Ballot operations against a cloned tree.
///
/// Nothing here commits; callers stage changes and commit them through
/// `commit_if_changed`, so a failed operation leaves nothing behind.
pub struct BallotStore<'k> {
    kernels: &'k KernelRegistry,
    engine: TallyEngine,
}

impl<'k> BallotStore<'k> {
    pub fn new(kernels: &'k KernelRegistry) -> Self {
        Self {
            kernels,
            engine: TallyEngine,
        }
    }

    pub fn kernels(&self) -> &KernelRegistry {
        self.kernels
    }

    pub fn load_ad(&self, tree: &Tree, ns: &Ns) -> Result<Ad, BallotError> {
        tree.try_read_json(&layout::ballot_ad(ns))?
            .ok_or_else(|| BallotError::NotFound(ns.clone()))
    }

    fn save_ad(&self, tree: &mut Tree, ad: &Ad) -> Result<(), BallotError> {
        tree.write_json(&layout::ballot_ad(&ad.id), ad)?;
        Ok(())
    }

    pub fn exists(&self, tree: &Tree, ns: &Ns) -> bool {
        tree.exists(&layout::ballot_ad(ns))
    }

    /// Create a ballot. An existing ballot at the same namespace is never
    /// overwritten.
    pub fn open(&self, tree: &mut Tree, mut ad: Ad) -> Result<Ad, BallotError> {
        ad.validate()?;
        if self.exists(tree, &ad.id) {
            return Err(BallotError::AlreadyExists(ad.id));
        }
        self.kernels.get(&ad.kernel)?.validate_state(&ad)?;
        ad.frozen = false;
        ad.closed = false;
        ad.cancelled = false;
        self.save_ad(tree, &ad)?;
        tracing::info!(ballot = %ad.id, kernel = %ad.kernel, choices = ad.choices.len(), "opened ballot");
        Ok(ad)
    }

    /// Record `voter`'s strength on `choice`, withdrawing any additional
    /// credits the new strengths cost beyond what was already advanced.
    pub fn cast_vote(
        &self,
        tree: &mut Tree,
        ns: &Ns,
        voter: &User,
        choice: &str,
        strength: f64,
        now: Timestamp,
    ) -> Result<VoterRecord, BallotError> {
        voter.validate()?;
        let ad = self.load_ad(tree, ns)?;
        ad.ensure_open()?;
        if ad.frozen {
            return Err(BallotError::Frozen(ns.clone()));
        }
        if !ad.has_choice(choice) {
            return Err(BallotError::UnknownChoice {
                ballot: ns.clone(),
                choice: choice.to_string(),
            });
        }
        if !strength.is_finite() {
            return Err(BallotError::InvalidStrength(strength));
        }
        if !civitas_groups::user_exists(tree, voter)
            || !civitas_groups::is_member(tree, &ad.participants, voter)?
        {
            return Err(BallotError::NotMember {
                user: voter.to_string(),
                group: ad.participants.to_string(),
            });
        }
        let kernel = self.kernels.get(&ad.kernel)?;

        let path = layout::ballot_vote(ns, voter);
        let mut record = tree
            .try_read_json::<VoterRecord>(&path)?
            .unwrap_or_else(|| VoterRecord::new(voter.clone()));
        if record.has_voted() && !kernel.allows_revision() {
            return Err(BallotError::RevisionNotAllowed {
                user: voter.to_string(),
                kernel: kernel.name().to_string(),
            });
        }

        let mut strengths = record.strengths.clone();
        strengths.insert(choice.to_string(), strength);
        let cost = kernel.cost(&ad, &strengths)?;
        let extra = cost - record.advanced;
        if extra > 0.0 {
            self.withdraw(tree, voter, extra)?;
            record.advanced = cost;
        }
        record.strengths = strengths;
        record.history.push(Election {
            choice: choice.to_string(),
            strength,
            cast_at: now,
        });
        tree.write_json(&path, &record)?;
        tracing::debug!(ballot = %ns, voter = %voter, choice, strength, advanced = record.advanced, "vote accepted");
        Ok(record)
    }

    fn withdraw(&self, tree: &mut Tree, user: &User, amount: Credits) -> Result<(), BallotError> {
        match civitas_groups::withdraw(tree, user, amount) {
            Ok(_) => Ok(()),
            Err(GroupError::InsufficientCredits {
                balance, requested, ..
            }) => Err(BallotError::InsufficientCredits {
                user: user.to_string(),
                balance,
                needed: requested,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Votes eligible for scoring: records of voters who are still registered.
    pub fn load_elections(&self, tree: &Tree, ns: &Ns) -> Result<AcceptedElections, BallotError> {
        let mut elections = AcceptedElections::default();
        for record in self.voter_records(tree, ns)? {
            if civitas_groups::user_exists(tree, &record.user) {
                elections.insert(record);
            } else {
                tracing::warn!(ballot = %ns, user = %record.user, "skipping vote of unregistered user");
            }
        }
        Ok(elections)
    }

    /// Advances held for voters who are no longer registered.
    pub fn forfeited_advances(&self, tree: &Tree, ns: &Ns) -> Result<BTreeMap<User, Credits>, BallotError> {
        Ok(self
            .voter_records(tree, ns)?
            .into_iter()
            .filter(|r| r.advanced > 0.0 && !civitas_groups::user_exists(tree, &r.user))
            .map(|r| (r.user, r.advanced))
            .collect())
    }

    fn voter_records(&self, tree: &Tree, ns: &Ns) -> Result<Vec<VoterRecord>, BallotError> {
        let mut records = Vec::new();
        for entry in tree.list_dir(&layout::ballot_votes_dir(ns)) {
            let Some(name) = layout::record_name(&entry) else {
                continue;
            };
            records.push(tree.read_json(&layout::ballot_vote(ns, &User::new(name)))?);
        }
        Ok(records)
    }

    fn compute_tally(
        &self,
        tree: &Tree,
        ad: &Ad,
        kernel: &dyn ScoreKernel,
    ) -> Result<(Tally, AcceptedElections), BallotError> {
        let elections = self.load_elections(tree, &ad.id)?;
        let scored = kernel.score(ad, &elections)?;
        let tally = self.engine.tally(ad, &elections, &scored, kernel)?;
        Ok((tally, elections))
    }

    /// Refresh the tally of an open ballot, or return the final tally of a
    /// closed one.
    pub fn tally(&self, tree: &mut Tree, ns: &Ns) -> Result<Tally, BallotError> {
        let ad = self.load_ad(tree, ns)?;
        if !ad.is_open() {
            return Ok(tree.read_json(&layout::ballot_tally(ns))?);
        }
        let kernel = self.kernels.get(&ad.kernel)?;
        let (tally, _) = self.compute_tally(tree, &ad, kernel)?;
        tree.write_json(&layout::ballot_tally(ns), &tally)?;
        Ok(tally)
    }

    /// Close the ballot: score, pick a winner, refund unspent advances.
    ///
    /// The kernel is resolved before anything is written, so an unknown
    /// kernel leaves the ballot open.
    pub fn close(&self, tree: &mut Tree, ns: &Ns) -> Result<Outcome, BallotError> {
        let mut ad = self.load_ad(tree, ns)?;
        ad.ensure_open()?;
        let kernel = self.kernels.get(&ad.kernel)?;
        let (tally, elections) = self.compute_tally(tree, &ad, kernel)?;
        let mut outcome = self.engine.close(&tally, &elections, kernel.bounty(&ad)?);
        outcome.forfeited = self.forfeited_advances(tree, ns)?;
        self.finish(tree, &mut ad, &tally, &outcome)?;
        tracing::info!(
            ballot = %ns,
            winner = outcome.winner.as_deref().unwrap_or("<none>"),
            refunded = outcome.total_refunded(),
            "closed ballot"
        );
        Ok(outcome)
    }

    /// Cancel the ballot and refund every voter's full advance.
    pub fn cancel(&self, tree: &mut Tree, ns: &Ns) -> Result<Outcome, BallotError> {
        let mut ad = self.load_ad(tree, ns)?;
        ad.ensure_open()?;
        let kernel = self.kernels.get(&ad.kernel)?;
        let (tally, elections) = self.compute_tally(tree, &ad, kernel)?;
        let mut outcome = self.engine.cancel(&tally, &elections);
        outcome.forfeited = self.forfeited_advances(tree, ns)?;
        self.finish(tree, &mut ad, &tally, &outcome)?;
        tracing::info!(ballot = %ns, refunded = outcome.total_refunded(), "cancelled ballot");
        Ok(outcome)
    }

    fn finish(&self, tree: &mut Tree, ad: &mut Ad, tally: &Tally, outcome: &Outcome) -> Result<(), BallotError> {
        for (user, amount) in &outcome.refunded {
            civitas_groups::deposit(tree, user, *amount)?;
        }
        for (user, amount) in &outcome.forfeited {
            tracing::warn!(ballot = %ad.id, user = %user, amount, "advance forfeited by unregistered voter");
        }
        if outcome.cancelled {
            ad.cancelled = true;
        } else {
            ad.closed = true;
        }
        ad.frozen = false;
        self.save_ad(tree, ad)?;
        tree.write_json(&layout::ballot_tally(&ad.id), tally)?;
        tree.write_json(&layout::ballot_outcome(&ad.id), outcome)?;
        Ok(())
    }

    pub fn freeze(&self, tree: &mut Tree, ns: &Ns) -> Result<(), BallotError> {
        let mut ad = self.load_ad(tree, ns)?;
        ad.ensure_open()?;
        if ad.frozen {
            return Err(BallotError::Frozen(ns.clone()));
        }
        ad.frozen = true;
        self.save_ad(tree, &ad)
    }

    pub fn unfreeze(&self, tree: &mut Tree, ns: &Ns) -> Result<(), BallotError> {
        let mut ad = self.load_ad(tree, ns)?;
        ad.ensure_open()?;
        if !ad.frozen {
            return Err(BallotError::NotFrozen(ns.clone()));
        }
        ad.frozen = false;
        self.save_ad(tree, &ad)
    }

    pub fn show(&self, tree: &Tree, ns: &Ns) -> Result<BallotView, BallotError> {
        Ok(BallotView {
            ad: self.load_ad(tree, ns)?,
            tally: tree.try_read_json(&layout::ballot_tally(ns))?,
            outcome: tree.try_read_json(&layout::ballot_outcome(ns))?,
        })
    }

    /// Namespaces of every ballot in the tree, sorted.
    pub fn list(&self, tree: &Tree) -> Vec<Ns> {
        let prefix = format!("{}/", layout::BALLOT_DIR);
        tree.files()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix)?.strip_suffix("/ad.json"))
            .filter_map(|ns| Ns::parse(ns).ok())
            // A voter named "ad" also ends in /ad.json; only real ads decode.
            .filter(|ns| self.load_ad(tree, ns).is_ok())
            .collect()
    }
}
