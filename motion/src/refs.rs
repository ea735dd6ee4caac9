//! Typed, directed references between motions.

use crate::error::MotionError;
use civitas_types::MotionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a reference, e.g. `addresses` for a proposal resolving a concern.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefType(String);

impl RefType {
    pub fn parse(raw: impl Into<String>) -> Result<Self, MotionError> {
        let raw = raw.into();
        if raw.is_empty() || raw.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(MotionError::InvalidRefType(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge `from -> to` of a given type.
///
/// Field order defines the canonical sort: by source, target, then type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ref {
    pub from: MotionId,
    pub to: MotionId,
    #[serde(rename = "type")]
    pub ref_type: RefType,
}

impl Ref {
    pub fn new(from: MotionId, to: MotionId, ref_type: RefType) -> Self {
        Self { from, to, ref_type }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.ref_type, self.to)
    }
}

/// A deduplicated, canonically sorted set of references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Refs(Vec<Ref>);

impl Refs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, r: &Ref) -> bool {
        self.0.binary_search(r).is_ok()
    }

    /// Insert `r`, keeping the set sorted. Returns whether it was new.
    pub fn insert(&mut self, r: Ref) -> bool {
        match self.0.binary_search(&r) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, r);
                true
            }
        }
    }

    /// Returns whether `r` was present.
    pub fn remove(&mut self, r: &Ref) -> bool {
        match self.0.binary_search(r) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Restore the invariant after deserializing hand-edited data.
    pub fn normalize(&mut self) {
        self.0.sort();
        self.0.dedup();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ref> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Ref> for Refs {
    fn from_iter<I: IntoIterator<Item = Ref>>(iter: I) -> Self {
        let mut refs = Self(iter.into_iter().collect());
        refs.normalize();
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(from: &str, to: &str, t: &str) -> Ref {
        Ref::new(MotionId::new(from), MotionId::new(to), RefType::parse(t).unwrap())
    }

    #[test]
    fn insert_dedups_and_sorts() {
        let mut refs = Refs::new();
        assert!(refs.insert(r("2", "1", "addresses")));
        assert!(refs.insert(r("1", "3", "addresses")));
        assert!(!refs.insert(r("2", "1", "addresses")));
        assert!(refs.insert(r("1", "3", "blocks")));
        let order: Vec<String> = refs.iter().map(|x| x.to_string()).collect();
        assert_eq!(
            order,
            vec!["1 -[addresses]-> 3", "1 -[blocks]-> 3", "2 -[addresses]-> 1"]
        );
    }

    #[test]
    fn remove_reports_presence() {
        let mut refs: Refs = vec![r("1", "2", "x"), r("1", "2", "x")].into_iter().collect();
        assert_eq!(refs.len(), 1);
        assert!(refs.remove(&r("1", "2", "x")));
        assert!(!refs.remove(&r("1", "2", "x")));
        assert!(refs.is_empty());
    }

    #[test]
    fn ref_type_validation() {
        assert!(RefType::parse("").is_err());
        assert!(RefType::parse("two words").is_err());
        assert_eq!(RefType::parse("resolves").unwrap().as_str(), "resolves");
    }

    #[test]
    fn ref_serializes_type_field() {
        let json = serde_json::to_value(r("1", "2", "addresses")).unwrap();
        assert_eq!(json["type"], "addresses");
    }
}
