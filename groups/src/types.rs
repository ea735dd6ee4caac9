use civitas_types::{Credits, Group, User};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A registered community member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: User,
    /// Spendable voting credits.
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl UserRecord {
    pub fn new(user: User) -> Self {
        Self {
            user,
            credits: 0.0,
            properties: BTreeMap::new(),
        }
    }
}

/// A voter group and its members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub group: Group,
    #[serde(default)]
    pub members: BTreeSet<User>,
}

impl GroupRecord {
    pub fn new(group: Group) -> Self {
        Self {
            group,
            members: BTreeSet::new(),
        }
    }
}
