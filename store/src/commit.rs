//! Commits: immutable, content-addressed snapshots of a branch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hex-encoded Blake2b-256 commit identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A commit holds the full tree of its branch at that point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub parent: Option<CommitId>,
    pub message: String,
    pub files: BTreeMap<String, Vec<u8>>,
}

impl Commit {
    /// Create a commit; its id is derived from parent, message and files.
    pub fn new(parent: Option<CommitId>, message: String, files: BTreeMap<String, Vec<u8>>) -> Self {
        let id = Self::compute_id(parent.as_ref(), &message, &files);
        Self {
            id,
            parent,
            message,
            files,
        }
    }

    pub fn compute_id(
        parent: Option<&CommitId>,
        message: &str,
        files: &BTreeMap<String, Vec<u8>>,
    ) -> CommitId {
        let parent_bytes = parent.map(|p| p.as_str().as_bytes()).unwrap_or_default();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(2 + files.len() * 2);
        parts.push(parent_bytes);
        parts.push(message.as_bytes());
        for (path, bytes) in files {
            parts.push(path.as_bytes());
            parts.push(bytes.as_slice());
        }
        CommitId(civitas_crypto::content_id(&parts))
    }

    /// Whether the stored id matches the commit's content.
    pub fn verify_id(&self) -> bool {
        Self::compute_id(self.parent.as_ref(), &self.message, &self.files) == self.id
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// What a clone receives: the branch head and its files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub head: Option<CommitId>,
    pub files: BTreeMap<String, Vec<u8>>,
}
