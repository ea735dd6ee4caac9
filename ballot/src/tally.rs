//! Aggregation of scored votes into tallies and outcomes.

use crate::ad::{AcceptedElections, Ad};
use crate::error::BallotError;
use crate::kernel::{Margin, ScoreKernel, ScoredVotes};
use civitas_types::{Credits, Ns, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A voter's strength on a choice and the score it contributed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthAndScore {
    pub strength: f64,
    pub score: f64,
}

/// Running (or final) aggregate of a ballot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub ad: Ad,
    /// choice -> aggregate score. Every choice of the ad is present.
    pub scores: BTreeMap<String, f64>,
    pub scores_by_user: BTreeMap<User, BTreeMap<String, StrengthAndScore>>,
    /// user -> credits consumed by their current votes.
    pub charges: BTreeMap<User, Credits>,
    pub margin: Margin,
}

/// Result of closing or cancelling a ballot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub ballot: Ns,
    pub winner: Option<String>,
    pub cancelled: bool,
    pub scores: BTreeMap<String, f64>,
    pub scores_by_user: BTreeMap<User, BTreeMap<String, StrengthAndScore>>,
    pub refunded: BTreeMap<User, Credits>,
    pub rewarded: BTreeMap<User, Credits>,
    /// Advances of voters who were deregistered before the ballot ended.
    /// They have no balance to refund into, so the credits stay recorded here.
    #[serde(default)]
    pub forfeited: BTreeMap<User, Credits>,
}

impl Outcome {
    pub fn total_refunded(&self) -> Credits {
        self.refunded.values().sum()
    }

    pub fn total_rewarded(&self) -> Credits {
        self.rewarded.values().sum()
    }

    pub fn total_forfeited(&self) -> Credits {
        self.forfeited.values().sum()
    }
}

/// Stateless tallying rules.
///
/// Winner: the choice with the greatest aggregate score strictly above zero.
/// Equal maxima go to the lexicographically smallest choice. No positive
/// score, no winner.
#[derive(Clone, Copy, Debug, Default)]
pub struct TallyEngine;

impl TallyEngine {
    /// Aggregate scored votes per choice and per user, then attach the
    /// kernel's margin calculators.
    pub fn tally(
        &self,
        ad: &Ad,
        elections: &AcceptedElections,
        scored: &ScoredVotes,
        kernel: &dyn ScoreKernel,
    ) -> Result<Tally, BallotError> {
        let mut scores: BTreeMap<String, f64> =
            ad.choices.iter().map(|c| (c.clone(), 0.0)).collect();
        let mut scores_by_user = BTreeMap::new();
        for (user, contributions) in &scored.scores {
            let strengths = elections.strengths.get(user);
            let mut per_choice = BTreeMap::new();
            for (choice, score) in contributions {
                let Some(total) = scores.get_mut(choice) else {
                    continue;
                };
                *total += score;
                let strength = strengths
                    .and_then(|s| s.get(choice))
                    .copied()
                    .unwrap_or(0.0);
                per_choice.insert(choice.clone(), StrengthAndScore { strength, score: *score });
            }
            scores_by_user.insert(user.clone(), per_choice);
        }
        let mut tally = Tally {
            ad: ad.clone(),
            scores,
            scores_by_user,
            charges: scored.costs.clone(),
            margin: Margin::default(),
        };
        tally.margin = kernel.calc_js(ad, &tally)?;
        Ok(tally)
    }

    pub fn winner(&self, scores: &BTreeMap<String, f64>) -> Option<String> {
        let mut best: Option<(&String, f64)> = None;
        // BTreeMap iterates in choice order, so a strict comparison keeps the
        // smallest choice among equal maxima.
        for (choice, &score) in scores {
            if score > 0.0 && best.map_or(true, |(_, b)| score > b) {
                best = Some((choice, score));
            }
        }
        best.map(|(c, _)| c.clone())
    }

    /// Unspent advance per voter: advanced − consumed, only positive entries.
    pub fn refunds(
        &self,
        elections: &AcceptedElections,
        consumed: &BTreeMap<User, Credits>,
    ) -> BTreeMap<User, Credits> {
        elections
            .advanced
            .iter()
            .filter_map(|(user, advanced)| {
                let used = consumed.get(user).copied().unwrap_or(0.0);
                let refund = advanced - used;
                (refund > 0.0).then(|| (user.clone(), refund))
            })
            .collect()
    }

    /// Split `bounty` among users who contributed positively to `winner`,
    /// in proportion to their contribution.
    pub fn rewards(&self, tally: &Tally, winner: &str, bounty: Credits) -> BTreeMap<User, Credits> {
        if bounty <= 0.0 {
            return BTreeMap::new();
        }
        let supporters: Vec<(&User, f64)> = tally
            .scores_by_user
            .iter()
            .filter_map(|(user, per_choice)| {
                per_choice
                    .get(winner)
                    .map(|s| s.score)
                    .filter(|s| *s > 0.0)
                    .map(|s| (user, s))
            })
            .collect();
        let total: f64 = supporters.iter().map(|(_, s)| s).sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        supporters
            .into_iter()
            .map(|(user, s)| (user.clone(), bounty * s / total))
            .collect()
    }

    /// Outcome of a closed ballot.
    pub fn close(&self, tally: &Tally, elections: &AcceptedElections, bounty: Credits) -> Outcome {
        let winner = self.winner(&tally.scores);
        let rewarded = winner
            .as_deref()
            .map(|w| self.rewards(tally, w, bounty))
            .unwrap_or_default();
        Outcome {
            ballot: tally.ad.id.clone(),
            winner,
            cancelled: false,
            scores: tally.scores.clone(),
            scores_by_user: tally.scores_by_user.clone(),
            refunded: self.refunds(elections, &tally.charges),
            rewarded,
            forfeited: BTreeMap::new(),
        }
    }

    /// Outcome of a cancelled ballot: nothing was consumed, everything is refunded.
    pub fn cancel(&self, tally: &Tally, elections: &AcceptedElections) -> Outcome {
        Outcome {
            ballot: tally.ad.id.clone(),
            winner: None,
            cancelled: true,
            scores: tally.scores.clone(),
            scores_by_user: tally.scores_by_user.clone(),
            refunded: self.refunds(elections, &BTreeMap::new()),
            rewarded: BTreeMap::new(),
            forfeited: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{QvKernel, QvState, QV_KERNEL};
    use crate::testutil::{ad, ad_with};

    fn vote(e: &mut AcceptedElections, user: &str, choice: &str, s: f64, advanced: f64) {
        let u = User::new(user);
        e.strengths.entry(u.clone()).or_default().insert(choice.into(), s);
        e.advanced.insert(u, advanced);
    }

    fn run(a: &Ad, e: &AcceptedElections) -> Tally {
        let scored = QvKernel.score(a, e).unwrap();
        TallyEngine.tally(a, e, &scored, &QvKernel).unwrap()
    }

    #[test]
    fn single_voter_two_choices() {
        let a = ad(&["a", "b"]);
        let mut e = AcceptedElections::default();
        vote(&mut e, "alice", "a", 1.0, 1.0);
        let tally = run(&a, &e);
        assert!(tally.scores["a"] > 0.0);
        assert_eq!(tally.scores["b"], 0.0);
        assert_eq!(tally.charges[&User::new("alice")], 1.0);
        let outcome = TallyEngine.close(&tally, &e, 0.0);
        assert_eq!(outcome.winner.as_deref(), Some("a"));
        assert!(outcome.refunded.is_empty());
    }

    #[test]
    fn ties_go_to_smallest_choice() {
        let scores = BTreeMap::from([
            ("b".to_string(), 3.0),
            ("a".to_string(), 3.0),
            ("c".to_string(), 1.0),
        ]);
        assert_eq!(TallyEngine.winner(&scores).as_deref(), Some("a"));
    }

    #[test]
    fn no_positive_score_means_no_winner() {
        let scores = BTreeMap::from([("a".to_string(), 0.0), ("b".to_string(), -2.0)]);
        assert_eq!(TallyEngine.winner(&scores), None);
        assert_eq!(TallyEngine.winner(&BTreeMap::new()), None);
    }

    #[test]
    fn refund_is_unspent_advance() {
        let a = ad(&["a"]);
        let mut e = AcceptedElections::default();
        // Voted 3 (advanced 9), then revised down to 1 (consumes 1).
        vote(&mut e, "alice", "a", 1.0, 9.0);
        let tally = run(&a, &e);
        let outcome = TallyEngine.close(&tally, &e, 0.0);
        assert_eq!(outcome.refunded[&User::new("alice")], 8.0);
    }

    #[test]
    fn cancel_refunds_everything() {
        let a = ad(&["a", "b"]);
        let mut e = AcceptedElections::default();
        vote(&mut e, "alice", "a", 2.0, 4.0);
        vote(&mut e, "bob", "b", 1.0, 1.0);
        let tally = run(&a, &e);
        let outcome = TallyEngine.cancel(&tally, &e);
        assert!(outcome.cancelled);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.total_refunded(), 5.0);
        assert!(outcome.rewarded.is_empty());
    }

    #[test]
    fn bounty_is_split_by_contribution_to_winner() {
        let a = ad_with(&["yes", "no"], QV_KERNEL, QvState::new(1.0).with_bounty(30.0));
        let mut e = AcceptedElections::default();
        vote(&mut e, "alice", "yes", 2.0, 4.0);
        vote(&mut e, "bob", "yes", 1.0, 1.0);
        vote(&mut e, "carol", "no", 1.0, 1.0);
        let tally = run(&a, &e);
        let outcome = TallyEngine.close(&tally, &e, 30.0);
        assert_eq!(outcome.winner.as_deref(), Some("yes"));
        assert_eq!(outcome.rewarded[&User::new("alice")], 20.0);
        assert_eq!(outcome.rewarded[&User::new("bob")], 10.0);
        assert!(!outcome.rewarded.contains_key(&User::new("carol")));
    }

    #[test]
    fn outcome_serde_roundtrip() {
        let a = ad(&["a", "b"]);
        let mut e = AcceptedElections::default();
        vote(&mut e, "alice", "a", 1.5, 3.0);
        let outcome = TallyEngine.close(&run(&a, &e), &e, 0.0);
        let json = serde_json::to_string(&outcome).unwrap();
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }
}
