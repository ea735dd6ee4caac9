//! The orchestrator and its transaction loop.

use crate::config::GovConfig;
use crate::error::GovError;
use civitas_ballot::{BallotStore, KernelRegistry};
use civitas_motion::Motion;
use civitas_policy::{BuiltinPolicy, NoticeSink, Notices, PolicyEnv, PolicyRegistry};
use civitas_store::{commit_if_changed, Change, Cloned, Remote, Tree};
use civitas_types::{Clock, MotionId, Timestamp};
use civitas_utils::StatsCounter;
use serde::Serialize;
use std::sync::Arc;

/// Counters kept by every orchestrator.
pub const STAT_NAMES: &[&str] = &["transactions", "commits", "noop_commits", "conflicts"];

/// One attempt of a transaction: the working tree, the policy environment
/// and the notices to deliver once the attempt is pushed.
pub struct Txn<'a> {
    pub tree: &'a mut Tree,
    pub env: PolicyEnv<'a>,
    outbox: Vec<(MotionId, Notices)>,
}

impl<'a> Txn<'a> {
    pub fn now(&self) -> Timestamp {
        self.env.now
    }

    pub fn ballots(&self) -> BallotStore<'a> {
        self.env.ballots()
    }

    /// Queue notices for `motion`. They are dropped if the attempt fails.
    pub fn notify(&mut self, motion: &MotionId, notices: Notices) {
        if !notices.is_empty() {
            self.outbox.push((motion.clone(), notices));
        }
    }
}

pub struct GovernanceOrchestrator {
    remote: Arc<dyn Remote>,
    config: GovConfig,
    policies: Arc<PolicyRegistry>,
    kernels: Arc<KernelRegistry>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NoticeSink>,
    stats: StatsCounter,
}

impl GovernanceOrchestrator {
    pub fn new(
        remote: Arc<dyn Remote>,
        config: GovConfig,
        policies: Arc<PolicyRegistry>,
        kernels: Arc<KernelRegistry>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            remote,
            config,
            policies,
            kernels,
            clock,
            sink,
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    pub fn config(&self) -> &GovConfig {
        &self.config
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn kernels(&self) -> &KernelRegistry {
        &self.kernels
    }

    pub(crate) fn remote(&self) -> &Arc<dyn Remote> {
        &self.remote
    }

    pub(crate) fn policy_for(&self, motion: &Motion) -> Result<&BuiltinPolicy, GovError> {
        Ok(self.policies.get(&motion.policy)?)
    }

    /// Run `f` as one transaction on the community branch.
    pub fn transact<R, F>(&self, summary: &str, f: F) -> Result<R, GovError>
    where
        R: Serialize,
        F: FnMut(&mut Txn<'_>) -> Result<R, GovError>,
    {
        self.transact_on(&self.config.community_branch, summary, f)
    }

    /// Clone `branch`, apply `f`, and commit and push only if the tree
    /// changed. A conflicting push is retried on a fresh clone, reapplying
    /// `f`, up to `max_push_retries` more times. An error from `f` aborts
    /// with nothing pushed.
    pub fn transact_on<R, F>(&self, branch: &str, summary: &str, mut f: F) -> Result<R, GovError>
    where
        R: Serialize,
        F: FnMut(&mut Txn<'_>) -> Result<R, GovError>,
    {
        self.stats.increment("transactions");
        let attempts = self.config.max_push_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let mut cloned = Cloned::clone_from(Arc::clone(&self.remote), branch)?;
            let mut txn = Txn {
                tree: cloned.tree_mut(),
                env: PolicyEnv::new(&self.kernels, self.clock.now()),
                outbox: Vec::new(),
            };
            let result = f(&mut txn)?;
            let outbox = txn.outbox;

            match commit_if_changed(&mut cloned, Change::new(summary, result)) {
                Ok((change, committed)) => {
                    self.stats
                        .increment(if committed { "commits" } else { "noop_commits" });
                    for (motion, notices) in &outbox {
                        self.sink.deliver(motion, notices);
                    }
                    return Ok(change.result);
                }
                Err(e) if e.is_conflict() => {
                    self.stats.increment("conflicts");
                    tracing::warn!(
                        branch,
                        summary,
                        attempt,
                        attempts,
                        error = %e,
                        "push conflicted, retrying on a fresh clone"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(GovError::ConflictRetriesExhausted {
            branch: branch.to_string(),
            attempts,
        })
    }

    /// Read the community branch as pushed at clone time.
    pub fn read<R, F>(&self, f: F) -> Result<R, GovError>
    where
        F: FnOnce(&Tree, &PolicyEnv<'_>) -> Result<R, GovError>,
    {
        let cloned = Cloned::clone_from(Arc::clone(&self.remote), &self.config.community_branch)?;
        let env = PolicyEnv::new(&self.kernels, self.clock.now());
        f(cloned.tree(), &env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civitas_nullables::{NullClock, NullRemote};
    use civitas_policy::CollectingSink;

    fn orchestrator(remote: Arc<NullRemote>, retries: u32) -> GovernanceOrchestrator {
        let config = GovConfig {
            max_push_retries: retries,
            ..GovConfig::default()
        };
        GovernanceOrchestrator::new(
            remote,
            config.clone(),
            Arc::new(PolicyRegistry::builtin(&config.policy_config())),
            Arc::new(KernelRegistry::builtin()),
            Arc::new(NullClock::new(100)),
            Arc::new(CollectingSink::default()),
        )
    }

    #[test]
    fn unchanged_tree_is_not_pushed() {
        let remote = Arc::new(NullRemote::new());
        let gov = orchestrator(Arc::clone(&remote), 2);
        gov.transact("nothing", |_| Ok(())).unwrap();
        assert_eq!(remote.push_count(), 0);
        assert_eq!(gov.stats().get("noop_commits"), 1);
    }

    #[test]
    fn changed_tree_is_pushed_with_audit_message() {
        let remote = Arc::new(NullRemote::new());
        let gov = orchestrator(Arc::clone(&remote), 2);
        gov.transact("write x", |txn| {
            txn.tree.write_json("x.json", &1)?;
            Ok("done")
        })
        .unwrap();
        let log = remote.log("main");
        assert_eq!(log.len(), 1);
        assert!(log[0].message.starts_with("write x\n\n{"));
        assert!(log[0].message.contains("\"done\""));
    }

    #[test]
    fn failing_closure_pushes_nothing() {
        let remote = Arc::new(NullRemote::new());
        let gov = orchestrator(Arc::clone(&remote), 2);
        let err = gov
            .transact("boom", |txn| -> Result<(), GovError> {
                txn.tree.write_json("x.json", &1)?;
                Err(GovError::Precondition("no".into()))
            })
            .unwrap_err();
        assert!(matches!(err, GovError::Precondition(_)));
        assert_eq!(remote.push_count(), 0);
    }

    #[test]
    fn retries_are_bounded() {
        let remote = Arc::new(NullRemote::new());
        let gov = orchestrator(Arc::clone(&remote), 2);
        remote.inject_conflicts(3);
        let err = gov
            .transact("write", |txn| {
                txn.tree.write_json("x.json", &1)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, GovError::ConflictRetriesExhausted { attempts: 3, .. }));
        assert_eq!(gov.stats().get("conflicts"), 3);
        assert!(remote.log("main").is_empty());
    }

    #[test]
    fn recovers_within_retry_budget() {
        let remote = Arc::new(NullRemote::new());
        let gov = orchestrator(Arc::clone(&remote), 2);
        remote.inject_conflicts(2);
        gov.transact("write", |txn| {
            txn.tree.write_json("x.json", &1)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(remote.log("main").len(), 1);
        assert_eq!(gov.stats().get("commits"), 1);
    }
}
