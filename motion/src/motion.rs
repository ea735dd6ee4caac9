//! The motion entity and its state machine.
//!
//! ```text
//! Open <-> Frozen
//! Open | Frozen -> Closed | Cancelled
//! Closed | Cancelled -> Archived
//! ```

use crate::error::MotionError;
use crate::refs::Refs;
use civitas_types::{MotionId, PolicyName, Timestamp, User};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionType {
    Concern,
    Proposal,
}

impl MotionType {
    pub fn parse(s: &str) -> Result<Self, MotionError> {
        match s {
            "concern" => Ok(Self::Concern),
            "proposal" => Ok(Self::Proposal),
            other => Err(MotionError::UnknownType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concern => "concern",
            Self::Proposal => "proposal",
        }
    }
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state, derived from the motion's flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    Open,
    Frozen,
    Closed,
    Cancelled,
    Archived,
}

impl MotionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled | Self::Archived)
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Frozen => "frozen",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

/// Ranking data. Attention orders display, it never gates eligibility.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub attention: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    // identity
    pub id: MotionId,
    #[serde(rename = "type")]
    pub motion_type: MotionType,
    pub policy: PolicyName,
    #[serde(default)]
    pub author: Option<User>,
    // metadata
    #[serde(default)]
    pub tracker_url: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    // lifecycle
    pub opened_at: Timestamp,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub score: Score,
    // reference graph
    #[serde(default)]
    pub ref_to: Refs,
    #[serde(default)]
    pub ref_by: Refs,
}

/// Parameters of a new motion.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMotion {
    pub id: MotionId,
    pub motion_type: MotionType,
    pub policy: PolicyName,
    pub author: Option<User>,
    pub title: String,
    pub body: String,
    pub tracker_url: String,
    pub labels: Vec<String>,
}

/// Metadata update; `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionMeta {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tracker_url: Option<String>,
    pub labels: Option<Vec<String>>,
}

fn normalize_labels(mut labels: Vec<String>) -> Vec<String> {
    labels.retain(|l| !l.is_empty());
    labels.sort();
    labels.dedup();
    labels
}

impl Motion {
    pub fn new(spec: NewMotion, now: Timestamp) -> Self {
        Self {
            id: spec.id,
            motion_type: spec.motion_type,
            policy: spec.policy,
            author: spec.author,
            tracker_url: spec.tracker_url,
            title: spec.title,
            body: spec.body,
            labels: normalize_labels(spec.labels),
            opened_at: now,
            closed_at: None,
            frozen: false,
            closed: false,
            cancelled: false,
            archived: false,
            score: Score::default(),
            ref_to: Refs::new(),
            ref_by: Refs::new(),
        }
    }

    pub fn state(&self) -> MotionState {
        if self.archived {
            MotionState::Archived
        } else if self.closed {
            MotionState::Closed
        } else if self.cancelled {
            MotionState::Cancelled
        } else if self.frozen {
            MotionState::Frozen
        } else {
            MotionState::Open
        }
    }

    /// Neither closed nor cancelled (frozen motions count as open).
    pub fn is_open(&self) -> bool {
        !self.state().is_terminal()
    }

    pub fn is_concern(&self) -> bool {
        self.motion_type == MotionType::Concern
    }

    pub fn is_proposal(&self) -> bool {
        self.motion_type == MotionType::Proposal
    }

    fn ensure_not_terminal(&self) -> Result<(), MotionError> {
        let state = self.state();
        if state.is_terminal() {
            return Err(MotionError::AlreadyTerminal {
                id: self.id.to_string(),
                state,
            });
        }
        Ok(())
    }

    pub fn freeze(&mut self) -> Result<(), MotionError> {
        self.ensure_not_terminal()?;
        if self.frozen {
            return Err(MotionError::InvalidTransition {
                id: self.id.to_string(),
                action: "freeze",
                state: MotionState::Frozen,
            });
        }
        self.frozen = true;
        Ok(())
    }

    pub fn unfreeze(&mut self) -> Result<(), MotionError> {
        self.ensure_not_terminal()?;
        if !self.frozen {
            return Err(MotionError::InvalidTransition {
                id: self.id.to_string(),
                action: "unfreeze",
                state: MotionState::Open,
            });
        }
        self.frozen = false;
        Ok(())
    }

    pub fn close(&mut self, now: Timestamp) -> Result<(), MotionError> {
        self.ensure_not_terminal()?;
        self.closed = true;
        self.frozen = false;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: Timestamp) -> Result<(), MotionError> {
        self.ensure_not_terminal()?;
        self.cancelled = true;
        self.frozen = false;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), MotionError> {
        match self.state() {
            MotionState::Closed | MotionState::Cancelled => {
                self.archived = true;
                Ok(())
            }
            MotionState::Archived => Err(MotionError::AlreadyTerminal {
                id: self.id.to_string(),
                state: MotionState::Archived,
            }),
            MotionState::Open | MotionState::Frozen => Err(MotionError::NotTerminal(self.id.to_string())),
        }
    }

    pub fn apply_meta(&mut self, meta: MotionMeta) {
        if let Some(title) = meta.title {
            self.title = title;
        }
        if let Some(body) = meta.body {
            self.body = body;
        }
        if let Some(url) = meta.tracker_url {
            self.tracker_url = url;
        }
        if let Some(labels) = meta.labels {
            self.labels = normalize_labels(labels);
        }
    }
}
