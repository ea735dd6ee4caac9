//! Namespaces: ordered path segments addressing records in the community tree.

use crate::error::TypesError;
use crate::ids::validate_segment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A namespace such as `motion/42/approval`.
///
/// Serialized as its slash-separated path so that records stay readable.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ns(Vec<String>);

impl Ns {
    /// The empty (root) namespace.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a namespace from segments, validating each one.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, TypesError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ns = Self::root();
        for seg in segments {
            ns = ns.append(seg)?;
        }
        Ok(ns)
    }

    /// Parse a slash-separated path. Empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self, TypesError> {
        if path.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(path.split('/'))
    }

    /// Return a new namespace with `segment` appended.
    pub fn append(&self, segment: impl Into<String>) -> Result<Self, TypesError> {
        let segment = segment.into();
        validate_segment("namespace segment", &segment)
            .map_err(|_| TypesError::InvalidNamespace(segment.clone()))?;
        let mut segs = self.0.clone();
        segs.push(segment);
        Ok(Self(segs))
    }

    /// Concatenate two namespaces.
    pub fn join(&self, other: &Ns) -> Self {
        let mut segs = self.0.clone();
        segs.extend(other.0.iter().cloned());
        Self(segs)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Slash-separated path, relative to the tree root.
    pub fn path(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for Ns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl TryFrom<String> for Ns {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ns::parse(&s)
    }
}

impl From<Ns> for String {
    fn from(ns: Ns) -> Self {
        ns.path()
    }
}
