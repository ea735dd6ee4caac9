//! Persisted layout of the community and private branches.
//!
//! ```text
//! motion/<id>.json
//! ballot/<ns>/ad.json
//! ballot/<ns>/votes/<user>.json
//! ballot/<ns>/tally.json
//! ballot/<ns>/outcome.json
//! member/users/<user>.json
//! member/groups/<group>.json
//! policy/<motion-id>/state.json
//! id/public_credentials.json      (community branch)
//! id/private_credentials.json     (private branch)
//! ```
//!
//! Identifiers are validated before they reach these functions, so each one
//! maps to exactly one path segment.

use civitas_types::{Group, MotionId, Ns, User};

pub const MOTION_DIR: &str = "motion";
pub const BALLOT_DIR: &str = "ballot";
pub const USERS_DIR: &str = "member/users";
pub const GROUPS_DIR: &str = "member/groups";
pub const POLICY_DIR: &str = "policy";

pub const PUBLIC_CREDENTIALS: &str = "id/public_credentials.json";
pub const PRIVATE_CREDENTIALS: &str = "id/private_credentials.json";

const JSON_EXT: &str = ".json";

pub fn motion(id: &MotionId) -> String {
    format!("{MOTION_DIR}/{id}{JSON_EXT}")
}

pub fn ballot_dir(ns: &Ns) -> String {
    format!("{BALLOT_DIR}/{}", ns.path())
}

pub fn ballot_ad(ns: &Ns) -> String {
    format!("{}/ad.json", ballot_dir(ns))
}

pub fn ballot_votes_dir(ns: &Ns) -> String {
    format!("{}/votes", ballot_dir(ns))
}

pub fn ballot_vote(ns: &Ns, user: &User) -> String {
    format!("{}/{user}{JSON_EXT}", ballot_votes_dir(ns))
}

pub fn ballot_tally(ns: &Ns) -> String {
    format!("{}/tally.json", ballot_dir(ns))
}

pub fn ballot_outcome(ns: &Ns) -> String {
    format!("{}/outcome.json", ballot_dir(ns))
}

pub fn user(user: &User) -> String {
    format!("{USERS_DIR}/{user}{JSON_EXT}")
}

pub fn group(group: &Group) -> String {
    format!("{GROUPS_DIR}/{group}{JSON_EXT}")
}

pub fn policy_state(id: &MotionId) -> String {
    format!("{POLICY_DIR}/{id}/state.json")
}

/// Strip the `.json` extension from a directory entry.
pub fn record_name(entry: &str) -> Option<&str> {
    entry.strip_suffix(JSON_EXT).filter(|s| !s.is_empty())
}
