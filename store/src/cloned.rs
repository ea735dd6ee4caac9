//! Cloned branches, local commits, and the commit-if-changed discipline.

use crate::commit::{Commit, CommitId};
use crate::remote::Remote;
use crate::tree::Tree;
use crate::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A change that can be recorded in the audit trail.
///
/// The commit message is the summary line followed by the JSON of the change.
pub trait Commitable: Serialize {
    fn message(&self) -> String;
}

/// A summarized change together with its result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Change<R> {
    #[serde(rename = "msg")]
    pub msg: String,
    pub result: R,
}

impl<R> Change<R> {
    pub fn new(msg: impl Into<String>, result: R) -> Self {
        Self {
            msg: msg.into(),
            result,
        }
    }
}

impl<R: Serialize> Commitable for Change<R> {
    fn message(&self) -> String {
        self.msg.clone()
    }
}

/// Render a commit message: summary, blank line, JSON record.
pub fn commit_message<C: Commitable>(change: &C) -> Result<String, StoreError> {
    let json = serde_json::to_string_pretty(change).map_err(|e| StoreError::Serialization {
        path: "<commit message>".to_string(),
        reason: e.to_string(),
    })?;
    Ok(format!("{}\n\n{}\n", change.message(), json))
}

/// Working-tree status relative to the last local commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub changed: Vec<String>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
    }
}

/// A local clone of one branch.
pub struct Cloned {
    remote: Arc<dyn Remote>,
    branch: String,
    /// Remote head at clone time (or after the last successful push).
    base: Option<CommitId>,
    /// Local head, including unpushed commits.
    head: Option<CommitId>,
    committed: BTreeMap<String, Vec<u8>>,
    pending: Vec<Commit>,
    tree: Tree,
}

impl Cloned {
    /// Clone `branch` from `remote`.
    pub fn clone_from(remote: Arc<dyn Remote>, branch: &str) -> Result<Self, StoreError> {
        let snapshot = remote.clone_branch(branch)?;
        tracing::debug!(
            branch,
            head = snapshot.head.as_ref().map(|h| h.short()).unwrap_or("<none>"),
            files = snapshot.files.len(),
            "cloned branch"
        );
        Ok(Self {
            remote,
            branch: branch.to_string(),
            base: snapshot.head.clone(),
            head: snapshot.head,
            committed: snapshot.files.clone(),
            pending: Vec::new(),
            tree: Tree::from_files(snapshot.files),
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn base(&self) -> Option<&CommitId> {
        self.base.as_ref()
    }

    pub fn head(&self) -> Option<&CommitId> {
        self.head.as_ref()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn status(&self) -> Status {
        Status {
            changed: self.tree.diff(&self.committed),
        }
    }

    pub fn has_unpushed(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Record the working tree as a new local commit.
    pub fn commit(&mut self, message: String) -> CommitId {
        let commit = Commit::new(self.head.clone(), message, self.tree.files().clone());
        let id = commit.id.clone();
        tracing::debug!(branch = %self.branch, commit = id.short(), summary = commit.summary(), "committed");
        self.committed = commit.files.clone();
        self.head = Some(id.clone());
        self.pending.push(commit);
        id
    }

    /// Push local commits. A push with nothing pending is a no-op.
    pub fn push(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.remote
            .push(&self.branch, self.base.as_ref(), &self.pending)?;
        tracing::info!(
            branch = %self.branch,
            commits = self.pending.len(),
            head = self.head.as_ref().map(|h| h.short()).unwrap_or("<none>"),
            "pushed"
        );
        self.pending.clear();
        self.base = self.head.clone();
        Ok(())
    }
}

/// Commit `change` and push, but only if the working tree differs from the
/// last commit. Returns the change and whether anything was committed.
pub fn commit_if_changed<C: Commitable>(cloned: &mut Cloned, change: C) -> Result<(C, bool), StoreError> {
    let status = cloned.status();
    if status.is_clean() {
        tracing::debug!(branch = cloned.branch(), summary = %change.message(), "nothing to commit");
        return Ok((change, false));
    }
    let message = commit_message(&change)?;
    cloned.commit(message);
    cloned.push()?;
    Ok((change, true))
}
