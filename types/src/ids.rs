//! String identifiers used across the community tree.
//!
//! Users, motions and groups end up as path segments in the versioned store,
//! so their raw strings are validated before anything is written.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Check that `value` can be used as a single path segment.
pub fn validate_segment(kind: &'static str, value: &str) -> Result<(), TypesError> {
    let bad = value.is_empty()
        || value.starts_with('.')
        || value.contains('/')
        || value.contains('\\')
        || value.chars().any(|c| c.is_control());
    if bad {
        return Err(TypesError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Parse and validate in one step.
            pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
                let id = Self(raw.into());
                id.validate()?;
                Ok(id)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn validate(&self) -> Result<(), TypesError> {
                validate_segment($kind, &self.0)
            }

            pub fn is_valid(&self) -> bool {
                self.validate().is_ok()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// A community member's unique handle.
    User,
    "user"
);

string_id!(
    /// Stable identity of a motion (concern or proposal).
    MotionId,
    "motion id"
);

string_id!(
    /// A voter group.
    Group,
    "group"
);

string_id!(
    /// Registered name of a motion policy.
    PolicyName,
    "policy name"
);

string_id!(
    /// Registered name of a score kernel.
    KernelName,
    "kernel name"
);

impl Group {
    /// The group every registered user belongs to.
    pub const EVERYBODY: &'static str = "everybody";

    pub fn everybody() -> Self {
        Self::new(Self::EVERYBODY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_handles() {
        assert!(User::parse("alice").is_ok());
        assert!(User::parse("bob-42_x.y").is_ok());
        assert!(MotionId::parse("123").is_ok());
    }

    #[test]
    fn rejects_path_like_handles() {
        for raw in ["", "a/b", "..", ".hidden", "a\\b", "tab\there"] {
            let err = User::parse(raw).unwrap_err();
            assert!(matches!(err, TypesError::InvalidIdentifier { kind: "user", .. }));
        }
    }

    #[test]
    fn serializes_as_bare_string() {
        let json = serde_json::to_string(&MotionId::new("m1")).unwrap();
        assert_eq!(json, "\"m1\"");
        let back: MotionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "m1");
    }

    #[test]
    fn everybody_group_name() {
        assert_eq!(Group::everybody().as_str(), "everybody");
    }
}
