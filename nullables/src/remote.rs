//! Nullable remote — thread-safe in-memory branches for testing.

use civitas_store::{conflict, validate_chain, Commit, CommitId, Remote, Snapshot, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// An in-memory [`Remote`] that keeps every pushed commit.
///
/// Pushes and rejected pushes are counted, and conflicts can be injected to
/// exercise retry paths.
#[derive(Default)]
pub struct NullRemote {
    branches: Mutex<HashMap<String, Vec<Commit>>>,
    pushes: AtomicU64,
    conflicts: AtomicU64,
    injected_conflicts: AtomicU64,
}

impl NullRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn branches(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Commit>>>, StoreError> {
        self.branches
            .lock()
            .map_err(|e| StoreError::Backend(format!("null remote poisoned: {e}")))
    }

    /// Make the next `n` pushes fail with a conflict regardless of their base.
    pub fn inject_conflicts(&self, n: u64) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Number of accepted pushes.
    pub fn push_count(&self) -> u64 {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Number of rejected (non fast-forward) pushes.
    pub fn conflict_count(&self) -> u64 {
        self.conflicts.load(Ordering::SeqCst)
    }

    /// Commits on `branch`, oldest first.
    pub fn log(&self, branch: &str) -> Vec<Commit> {
        self.branches()
            .map(|b| b.get(branch).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn take_injected(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Remote for NullRemote {
    fn head(&self, branch: &str) -> Result<Option<CommitId>, StoreError> {
        Ok(self
            .branches()?
            .get(branch)
            .and_then(|log| log.last())
            .map(|c| c.id.clone()))
    }

    fn clone_branch(&self, branch: &str) -> Result<Snapshot, StoreError> {
        Ok(match self.branches()?.get(branch).and_then(|log| log.last()) {
            Some(commit) => Snapshot {
                head: Some(commit.id.clone()),
                files: commit.files.clone(),
            },
            None => Snapshot::default(),
        })
    }

    fn push(
        &self,
        branch: &str,
        expected_head: Option<&CommitId>,
        commits: &[Commit],
    ) -> Result<(), StoreError> {
        let mut branches = self.branches()?;
        let log = branches.entry(branch.to_string()).or_default();
        let actual = log.last().map(|c| c.id.clone());
        if actual.as_ref() != expected_head || self.take_injected() {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(branch, "null remote rejected push");
            return Err(conflict(branch, expected_head, actual.as_ref()));
        }
        validate_chain(expected_head, commits)?;
        log.extend_from_slice(commits);
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn push_and_clone() {
        let remote = NullRemote::new();
        let c = Commit::new(None, "init".into(), BTreeMap::from([("a".to_string(), vec![1])]));
        remote.push("main", None, &[c.clone()]).unwrap();
        let snap = remote.clone_branch("main").unwrap();
        assert_eq!(snap.head, Some(c.id));
        assert_eq!(remote.push_count(), 1);
        assert_eq!(remote.log("main").len(), 1);
    }

    #[test]
    fn stale_push_is_counted_as_conflict() {
        let remote = NullRemote::new();
        let a = Commit::new(None, "a".into(), BTreeMap::new());
        let b = Commit::new(None, "b".into(), BTreeMap::new());
        remote.push("main", None, &[a]).unwrap();
        assert!(remote.push("main", None, &[b]).unwrap_err().is_conflict());
        assert_eq!(remote.conflict_count(), 1);
    }

    #[test]
    fn injected_conflicts_are_consumed() {
        let remote = NullRemote::new();
        remote.inject_conflicts(1);
        let a = Commit::new(None, "a".into(), BTreeMap::new());
        assert!(remote.push("main", None, &[a.clone()]).is_err());
        remote.push("main", None, &[a]).unwrap();
        assert_eq!(remote.conflict_count(), 1);
        assert_eq!(remote.push_count(), 1);
    }
}
