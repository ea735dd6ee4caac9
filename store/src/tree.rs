//! In-memory working tree of a cloned branch.

use crate::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Files of a working tree, keyed by slash-separated relative path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    files: BTreeMap<String, Vec<u8>>,
}

fn check_path(path: &str) -> Result<(), StoreError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: BTreeMap<String, Vec<u8>>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, Vec<u8>> {
        self.files
    }

    pub fn read_bytes(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|b| b.as_slice())
    }

    pub fn write_bytes(&mut self, path: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        check_path(path)?;
        self.files.insert(path.to_string(), bytes);
        Ok(())
    }

    /// Read and decode a JSON record; missing files are [`StoreError::NotFound`].
    pub fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        self.try_read_json(path)?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    /// Read and decode a JSON record if it exists.
    pub fn try_read_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        match self.files.get(path) {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization {
                    path: path.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Encode `value` as pretty JSON (with trailing newline) and store it.
    ///
    /// Writing identical bytes leaves the tree unchanged, so re-saving an
    /// unmodified record never makes a commit necessary.
    pub fn write_json<T: Serialize>(&mut self, path: &str, value: &T) -> Result<(), StoreError> {
        let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        bytes.push(b'\n');
        self.write_bytes(path, bytes)
    }

    /// Whether `path` is a file or a directory with at least one file.
    pub fn exists(&self, path: &str) -> bool {
        if self.files.contains_key(path) {
            return true;
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    /// Names of the immediate children of directory `dir`, sorted.
    pub fn list_dir(&self, dir: &str) -> Vec<String> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.trim_end_matches('/'))
        };
        let mut names = BTreeSet::new();
        for key in self.files.range(prefix.clone()..).map(|(k, _)| k) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            let child = rest.split('/').next().unwrap_or(rest);
            names.insert(child.to_string());
        }
        names.into_iter().collect()
    }

    /// Paths whose content differs between `self` and `other`.
    pub fn diff(&self, other: &BTreeMap<String, Vec<u8>>) -> Vec<String> {
        let mut changed = BTreeSet::new();
        for (path, bytes) in &self.files {
            if other.get(path) != Some(bytes) {
                changed.insert(path.clone());
            }
        }
        for path in other.keys() {
            if !self.files.contains_key(path) {
                changed.insert(path.clone());
            }
        }
        changed.into_iter().collect()
    }
}
