//! The remote side of the store: branch heads and their commit history.

use crate::commit::{Commit, CommitId, Snapshot};
use crate::StoreError;

/// A branch-capable, append-only snapshot store.
///
/// Implementations must make `push` atomic: either every commit lands and the
/// head moves, or nothing changes.
pub trait Remote: Send + Sync {
    /// Current head of `branch`, `None` for a branch with no commits.
    fn head(&self, branch: &str) -> Result<Option<CommitId>, StoreError>;

    /// Fetch the files at the head of `branch`.
    fn clone_branch(&self, branch: &str) -> Result<Snapshot, StoreError>;

    /// Append `commits` (oldest first) to `branch`.
    ///
    /// Fails with [`StoreError::Conflict`] unless the remote head still equals
    /// `expected_head`.
    fn push(
        &self,
        branch: &str,
        expected_head: Option<&CommitId>,
        commits: &[Commit],
    ) -> Result<(), StoreError>;
}

/// Check that `commits` form a chain starting at `expected_head` and that
/// every id matches its content.
pub fn validate_chain(expected_head: Option<&CommitId>, commits: &[Commit]) -> Result<(), StoreError> {
    let mut parent = expected_head.cloned();
    for commit in commits {
        if commit.parent != parent {
            return Err(StoreError::Corruption(format!(
                "commit {} does not extend {}",
                commit.id.short(),
                parent.as_ref().map(|p| p.short()).unwrap_or("<root>")
            )));
        }
        if !commit.verify_id() {
            return Err(StoreError::Corruption(format!(
                "commit {} has a mismatched id",
                commit.id.short()
            )));
        }
        parent = Some(commit.id.clone());
    }
    Ok(())
}

/// Build the conflict error for a rejected push.
pub fn conflict(branch: &str, expected: Option<&CommitId>, actual: Option<&CommitId>) -> StoreError {
    let show = |c: Option<&CommitId>| c.map(|c| c.short().to_string()).unwrap_or_else(|| "<none>".into());
    StoreError::Conflict {
        branch: branch.to_string(),
        expected: show(expected),
        actual: show(actual),
    }
}
