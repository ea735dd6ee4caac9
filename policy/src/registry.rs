//! Closed set of built-in policies and the name-keyed registry over them.

use crate::concern::{ConcernPolicy, CONCERN_POLICY};
use crate::error::PolicyError;
use crate::notice::Notices;
use crate::policy::{MotionPolicy, PolicyEnv, PolicyView};
use crate::proposal::{ProposalPolicy, PROPOSAL_POLICY};
use civitas_ballot::Outcome;
use civitas_motion::{Motion, MotionType};
use civitas_store::Tree;
use civitas_types::{Credits, MotionId, Ns, PolicyName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters of the built-in policies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// `m` in `cost = sum(s^2) / m`.
    pub inverse_cost_multiplier: f64,
    /// Credits split among supporters of an approved proposal.
    pub proposal_bounty: Credits,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            inverse_cost_multiplier: 1.0,
            proposal_bounty: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum BuiltinPolicy {
    Concern(ConcernPolicy),
    Proposal(ProposalPolicy),
}

impl BuiltinPolicy {
    fn inner(&self) -> &dyn MotionPolicy {
        match self {
            BuiltinPolicy::Concern(p) => p,
            BuiltinPolicy::Proposal(p) => p,
        }
    }
}

impl MotionPolicy for BuiltinPolicy {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn ballot_id(&self, motion: &MotionId) -> Result<Ns, PolicyError> {
        self.inner().ballot_id(motion)
    }

    fn open(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError> {
        self.inner().open(tree, env, motion)
    }

    fn show(&self, tree: &Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<PolicyView, PolicyError> {
        self.inner().show(tree, env, motion)
    }

    fn process(&self, tree: &mut Tree, env: &PolicyEnv<'_>, motion: &Motion) -> Result<Notices, PolicyError> {
        self.inner().process(tree, env, motion)
    }

    fn on_ballot_outcome(
        &self,
        tree: &mut Tree,
        env: &PolicyEnv<'_>,
        motion: &Motion,
        outcome: &Outcome,
    ) -> Result<Notices, PolicyError> {
        self.inner().on_ballot_outcome(tree, env, motion, outcome)
    }
}

/// Policies by name. Built once, then shared read-only.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, BuiltinPolicy>,
}

impl PolicyRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin(config: &PolicyConfig) -> Self {
        let mut registry = Self::empty();
        for policy in [
            BuiltinPolicy::Concern(ConcernPolicy {
                inverse_cost_multiplier: config.inverse_cost_multiplier,
            }),
            BuiltinPolicy::Proposal(ProposalPolicy {
                inverse_cost_multiplier: config.inverse_cost_multiplier,
                bounty: config.proposal_bounty,
            }),
        ] {
            registry.policies.insert(policy.name().to_string(), policy);
        }
        registry
    }

    pub fn register(&mut self, policy: BuiltinPolicy) -> Result<(), PolicyError> {
        let name = policy.name().to_string();
        if self.policies.contains_key(&name) {
            return Err(PolicyError::DuplicatePolicy(name));
        }
        self.policies.insert(name, policy);
        Ok(())
    }

    pub fn get(&self, name: &PolicyName) -> Result<&BuiltinPolicy, PolicyError> {
        self.policies
            .get(name.as_str())
            .ok_or_else(|| PolicyError::UnknownPolicy(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

pub fn default_policy_for(motion_type: MotionType) -> PolicyName {
    match motion_type {
        MotionType::Concern => PolicyName::new(CONCERN_POLICY),
        MotionType::Proposal => PolicyName::new(PROPOSAL_POLICY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concern::PRIORITIZE_CHOICE;
    use crate::policy::{load_state, motion_ballot_ns};
    use crate::proposal::APPROVE_CHOICE;
    use civitas_ballot::{KernelRegistry, QvState};
    use civitas_motion::{MotionStore, NewMotion};
    use civitas_types::{Timestamp, User};

    const CONFIG: PolicyConfig = PolicyConfig {
        inverse_cost_multiplier: 1.0,
        proposal_bounty: 10.0,
    };

    fn open_motion(tree: &mut Tree, id: &str, motion_type: MotionType) -> Motion {
        MotionStore
            .open_motion(
                tree,
                NewMotion {
                    id: MotionId::new(id),
                    motion_type,
                    policy: default_policy_for(motion_type),
                    author: None,
                    title: format!("motion {id}"),
                    body: String::new(),
                    tracker_url: String::new(),
                    labels: vec![],
                },
                Timestamp::new(0),
            )
            .unwrap()
    }

    fn funded(tree: &mut Tree, name: &str, credits: f64) -> User {
        let user = User::new(name);
        civitas_groups::add_user(tree, &user).unwrap();
        civitas_groups::deposit(tree, &user, credits).unwrap();
        user
    }

    #[test]
    fn builtin_names_and_lookup() {
        let reg = PolicyRegistry::builtin(&CONFIG);
        assert_eq!(reg.names().collect::<Vec<_>>(), [CONCERN_POLICY, PROPOSAL_POLICY]);
        assert!(matches!(
            reg.get(&PolicyName::new("pmp-unknown")),
            Err(PolicyError::UnknownPolicy(_))
        ));
        let mut reg = reg;
        assert!(matches!(
            reg.register(BuiltinPolicy::Concern(ConcernPolicy {
                inverse_cost_multiplier: 2.0
            })),
            Err(PolicyError::DuplicatePolicy(_))
        ));
    }

    #[test]
    fn open_rejects_wrong_motion_type() {
        let kernels = KernelRegistry::builtin();
        let env = PolicyEnv::new(&kernels, Timestamp::new(1));
        let reg = PolicyRegistry::builtin(&CONFIG);
        let mut tree = Tree::new();
        let motion = open_motion(&mut tree, "1", MotionType::Proposal);
        let concern = reg.get(&PolicyName::new(CONCERN_POLICY)).unwrap();
        assert!(matches!(
            concern.open(&mut tree, &env, &motion),
            Err(PolicyError::WrongMotionType { .. })
        ));
    }

    #[test]
    fn concern_process_tracks_attention() {
        let kernels = KernelRegistry::builtin();
        let env = PolicyEnv::new(&kernels, Timestamp::new(1));
        let reg = PolicyRegistry::builtin(&CONFIG);
        let mut tree = Tree::new();
        let motion = open_motion(&mut tree, "7", MotionType::Concern);
        let policy = reg.get(&motion.policy).unwrap();
        assert_eq!(policy.open(&mut tree, &env, &motion).unwrap().len(), 1);

        let state = load_state(&tree, &motion.id).unwrap();
        assert_eq!(state.ballot, motion_ballot_ns(&motion.id, "priority").unwrap());

        let alice = funded(&mut tree, "alice", 100.0);
        env.ballots()
            .cast_vote(&mut tree, &state.ballot, &alice, PRIORITIZE_CHOICE, 3.0, env.now)
            .unwrap();
        assert!(policy.process(&mut tree, &env, &motion).unwrap().is_empty());
        let motion = MotionStore.get(&tree, &motion.id).unwrap();
        assert_eq!(motion.score.attention, 3.0);

        let view = policy.show(&tree, &env, &motion).unwrap();
        assert_eq!(view.state.policy.as_str(), CONCERN_POLICY);
        assert!(view.ballot.outcome.is_none());
    }

    #[test]
    fn proposal_outcome_pays_bounty_to_supporters() {
        let kernels = KernelRegistry::builtin();
        let env = PolicyEnv::new(&kernels, Timestamp::new(1));
        let reg = PolicyRegistry::builtin(&CONFIG);
        let mut tree = Tree::new();
        let motion = open_motion(&mut tree, "42", MotionType::Proposal);
        let policy = reg.get(&motion.policy).unwrap();
        policy.open(&mut tree, &env, &motion).unwrap();
        let ballot = policy.ballot_id(&motion.id).unwrap();

        let alice = funded(&mut tree, "alice", 100.0);
        let bob = funded(&mut tree, "bob", 100.0);
        env.ballots()
            .cast_vote(&mut tree, &ballot, &alice, APPROVE_CHOICE, 3.0, env.now)
            .unwrap();
        env.ballots()
            .cast_vote(&mut tree, &ballot, &bob, APPROVE_CHOICE, 1.0, env.now)
            .unwrap();

        let outcome = env.ballots().close(&mut tree, &ballot).unwrap();
        assert_eq!(outcome.winner.as_deref(), Some(APPROVE_CHOICE));
        let notices = policy.on_ballot_outcome(&mut tree, &env, &motion, &outcome).unwrap();
        let text = &notices.iter().next().unwrap().text;
        assert!(text.contains("has been closed"));
        assert!(text.contains("alice"));

        // 100 - 9 + 7.5 and 100 - 1 + 2.5
        assert_eq!(civitas_groups::balance(&tree, &alice).unwrap(), 98.5);
        assert_eq!(civitas_groups::balance(&tree, &bob).unwrap(), 101.5);
    }

    #[test]
    fn cancelled_proposal_pays_no_bounty() {
        let kernels = KernelRegistry::builtin();
        let env = PolicyEnv::new(&kernels, Timestamp::new(1));
        let reg = PolicyRegistry::builtin(&CONFIG);
        let mut tree = Tree::new();
        let motion = open_motion(&mut tree, "43", MotionType::Proposal);
        let policy = reg.get(&motion.policy).unwrap();
        policy.open(&mut tree, &env, &motion).unwrap();
        let ballot = policy.ballot_id(&motion.id).unwrap();
        let alice = funded(&mut tree, "alice", 100.0);
        env.ballots()
            .cast_vote(&mut tree, &ballot, &alice, APPROVE_CHOICE, 2.0, env.now)
            .unwrap();

        let outcome = env.ballots().cancel(&mut tree, &ballot).unwrap();
        let notices = policy.on_ballot_outcome(&mut tree, &env, &motion, &outcome).unwrap();
        assert!(notices.iter().next().unwrap().text.contains("cancelled"));
        assert_eq!(civitas_groups::balance(&tree, &alice).unwrap(), 100.0);
    }

    #[test]
    fn opened_ballots_link_back_to_their_motion() {
        let kernels = KernelRegistry::builtin();
        let env = PolicyEnv::new(&kernels, Timestamp::new(1));
        let reg = PolicyRegistry::builtin(&CONFIG);
        let mut tree = Tree::new();
        for (id, motion_type) in [("5", MotionType::Concern), ("6", MotionType::Proposal)] {
            let motion = open_motion(&mut tree, id, motion_type);
            let policy = reg.get(&motion.policy).unwrap();
            policy.open(&mut tree, &env, &motion).unwrap();
            let ad = env.ballots().load_ad(&tree, &policy.ballot_id(&motion.id).unwrap()).unwrap();
            let state = QvState::from_ad(&ad).unwrap();
            assert_eq!(state.motion_id, Some(motion.id.clone()));
        }
    }

    #[test]
    fn default_policies_by_type() {
        assert_eq!(default_policy_for(MotionType::Concern).as_str(), CONCERN_POLICY);
        assert_eq!(default_policy_for(MotionType::Proposal).as_str(), PROPOSAL_POLICY);
    }
}
