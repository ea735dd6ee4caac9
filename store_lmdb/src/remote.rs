//! Durable remote over an LMDB environment.

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions, RoTxn};

use civitas_store::{conflict, validate_chain, Commit, CommitId, Remote, Snapshot, StoreError};

use crate::LmdbError;

const COMMITS_DB: &str = "commits";
const HEADS_DB: &str = "heads";

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// A [`Remote`] whose branches live in an LMDB environment on disk.
///
/// `push` compares and swaps the branch head inside one write transaction.
/// LMDB admits a single writer at a time, across processes, so two pushers
/// racing on the same base cannot both win.
pub struct LmdbRemote {
    env: Env,
    commits: Database<Str, Bytes>,
    heads: Database<Str, Str>,
    path: PathBuf,
}

impl LmdbRemote {
    /// Open or create the environment under `path`.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process for this path and
        // never memory-mapped elsewhere.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(2)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let commits: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(COMMITS_DB))?;
        let heads: Database<Str, Str> = env.create_database(&mut wtxn, Some(HEADS_DB))?;
        wtxn.commit()?;
        tracing::info!(path = %path.display(), "opened LMDB remote");
        Ok(Self {
            env,
            commits,
            heads,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_head(&self, txn: &RoTxn, branch: &str) -> Result<Option<CommitId>, LmdbError> {
        Ok(self.heads.get(txn, branch)?.map(CommitId::new))
    }

    fn read_commit(&self, txn: &RoTxn, id: &CommitId) -> Result<Commit, LmdbError> {
        let bytes = self
            .commits
            .get(txn, id.as_str())?
            .ok_or_else(|| LmdbError::MissingCommit(id.to_string()))?;
        Ok(bincode::deserialize(bytes)?)
    }

    /// Commit history of `branch`, newest first.
    pub fn log(&self, branch: &str) -> Result<Vec<Commit>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        let mut next = self.read_head(&rtxn, branch)?;
        while let Some(id) = next {
            let commit = self.read_commit(&rtxn, &id)?;
            next = commit.parent.clone();
            out.push(commit);
        }
        Ok(out)
    }
}

impl Remote for LmdbRemote {
    fn head(&self, branch: &str) -> Result<Option<CommitId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_head(&rtxn, branch)?)
    }

    fn clone_branch(&self, branch: &str) -> Result<Snapshot, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(head) = self.read_head(&rtxn, branch)? else {
            return Ok(Snapshot::default());
        };
        let commit = self.read_commit(&rtxn, &head)?;
        Ok(Snapshot {
            head: Some(head),
            files: commit.files,
        })
    }

    fn push(
        &self,
        branch: &str,
        expected_head: Option<&CommitId>,
        commits: &[Commit],
    ) -> Result<(), StoreError> {
        let Some(last) = commits.last() else {
            return Ok(());
        };
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let actual = self.read_head(&wtxn, branch)?;
        if actual.as_ref() != expected_head {
            tracing::debug!(branch, "rejected non fast-forward push");
            return Err(conflict(branch, expected_head, actual.as_ref()));
        }
        validate_chain(expected_head, commits)?;
        for commit in commits {
            let bytes = bincode::serialize(commit).map_err(LmdbError::from)?;
            self.commits
                .put(&mut wtxn, commit.id.as_str(), &bytes)
                .map_err(LmdbError::from)?;
        }
        self.heads
            .put(&mut wtxn, branch, last.id.as_str())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn files(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn empty_branch_clones_empty() {
        let dir = tempfile::tempdir().unwrap();
        let remote = LmdbRemote::open(dir.path()).unwrap();
        assert_eq!(remote.head("main").unwrap(), None);
        assert_eq!(remote.clone_branch("main").unwrap(), Snapshot::default());
    }

    #[test]
    fn push_then_clone() {
        let dir = tempfile::tempdir().unwrap();
        let remote = LmdbRemote::open(dir.path()).unwrap();
        let c1 = Commit::new(None, "one".into(), files(&[("a.json", "1")]));
        let c2 = Commit::new(Some(c1.id.clone()), "two".into(), files(&[("a.json", "2")]));
        remote.push("main", None, &[c1.clone(), c2.clone()]).unwrap();

        let snap = remote.clone_branch("main").unwrap();
        assert_eq!(snap.head, Some(c2.id.clone()));
        assert_eq!(snap.files["a.json"], b"2".to_vec());
        let log = remote.log("main").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].summary(), "two");
    }

    #[test]
    fn stale_push_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let remote = LmdbRemote::open(dir.path()).unwrap();
        let base = Commit::new(None, "base".into(), files(&[]));
        remote.push("main", None, &[base.clone()]).unwrap();

        let ours = Commit::new(Some(base.id.clone()), "ours".into(), files(&[("x", "1")]));
        let theirs = Commit::new(Some(base.id.clone()), "theirs".into(), files(&[("y", "1")]));
        remote.push("main", Some(&base.id), &[ours.clone()]).unwrap();
        let err = remote.push("main", Some(&base.id), &[theirs]).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(remote.head("main").unwrap(), Some(ours.id));
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let c1 = Commit::new(None, "one".into(), files(&[("a", "1")]));
        {
            let remote = LmdbRemote::open(dir.path()).unwrap();
            remote.push("private", None, &[c1.clone()]).unwrap();
        }
        let remote = LmdbRemote::open(dir.path()).unwrap();
        assert_eq!(remote.head("private").unwrap(), Some(c1.id));
        assert_eq!(remote.head("main").unwrap(), None);
    }

    #[test]
    fn broken_chain_is_rejected_without_moving_head() {
        let dir = tempfile::tempdir().unwrap();
        let remote = LmdbRemote::open(dir.path()).unwrap();
        let orphan = Commit::new(Some(CommitId::new("deadbeef")), "x".into(), files(&[]));
        let err = remote.push("main", None, &[orphan]).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
        assert_eq!(remote.head("main").unwrap(), None);
    }
}
