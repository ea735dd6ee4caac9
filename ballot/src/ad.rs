//! Ballot definitions and the votes recorded against them.

use crate::error::BallotError;
use civitas_types::{Credits, Group, KernelName, Ns, Timestamp, User};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Definition of a ballot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: Ns,
    pub title: String,
    pub description: String,
    pub choices: Vec<String>,
    pub kernel: KernelName,
    /// Group whose members may vote.
    pub participants: Group,
    /// Kernel-specific configuration, e.g. the quadratic cost multiplier.
    pub kernel_state: serde_json::Value,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub cancelled: bool,
    pub created_at: Timestamp,
}

impl Ad {
    /// Check the shape of the definition: a non-root namespace and a
    /// non-empty list of distinct, non-empty choices.
    pub fn validate(&self) -> Result<(), BallotError> {
        if self.id.is_root() {
            return Err(BallotError::InvalidAd("ballot namespace is empty".into()));
        }
        self.participants.validate()?;
        self.kernel.validate()?;
        if self.choices.is_empty() {
            return Err(BallotError::InvalidAd("ballot has no choices".into()));
        }
        let mut seen = BTreeSet::new();
        for choice in &self.choices {
            if choice.is_empty() {
                return Err(BallotError::InvalidAd("empty choice".into()));
            }
            if !seen.insert(choice.as_str()) {
                return Err(BallotError::InvalidAd(format!("duplicate choice {choice:?}")));
            }
        }
        Ok(())
    }

    pub fn has_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }

    /// Neither closed nor cancelled.
    pub fn is_open(&self) -> bool {
        !self.closed && !self.cancelled
    }

    /// Fail unless the ballot is still open.
    pub fn ensure_open(&self) -> Result<(), BallotError> {
        if self.closed {
            return Err(BallotError::Closed(self.id.clone()));
        }
        if self.cancelled {
            return Err(BallotError::Cancelled(self.id.clone()));
        }
        Ok(())
    }
}

/// One cast vote, as kept in a voter's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Election {
    pub choice: String,
    pub strength: f64,
    pub cast_at: Timestamp,
}

/// Everything a single voter has done on a ballot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub user: User,
    /// Current strength per choice; later votes on a choice replace earlier ones.
    pub strengths: BTreeMap<String, f64>,
    /// Credits withdrawn from the voter so far.
    pub advanced: Credits,
    pub history: Vec<Election>,
}

impl VoterRecord {
    pub fn new(user: User) -> Self {
        Self {
            user,
            strengths: BTreeMap::new(),
            advanced: 0.0,
            history: Vec::new(),
        }
    }

    pub fn has_voted(&self) -> bool {
        !self.history.is_empty()
    }
}

/// The validated votes of a ballot, ready to be scored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceptedElections {
    pub strengths: BTreeMap<User, BTreeMap<String, f64>>,
    pub advanced: BTreeMap<User, Credits>,
}

impl AcceptedElections {
    pub fn insert(&mut self, record: VoterRecord) {
        self.advanced.insert(record.user.clone(), record.advanced);
        self.strengths.insert(record.user, record.strengths);
    }

    pub fn voters(&self) -> impl Iterator<Item = &User> {
        self.strengths.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
    }
}

impl FromIterator<VoterRecord> for AcceptedElections {
    fn from_iter<I: IntoIterator<Item = VoterRecord>>(iter: I) -> Self {
        let mut out = Self::default();
        for record in iter {
            out.insert(record);
        }
        out
    }
}
