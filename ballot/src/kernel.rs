//! Score kernels: pluggable strategies that turn accepted elections into
//! scored contributions.
//!
//! The set of kernels is closed ([`BuiltinKernel`]) and looked up by name in a
//! [`KernelRegistry`] built once at startup.

use crate::ad::{AcceptedElections, Ad};
use crate::error::BallotError;
use crate::tally::Tally;
use civitas_types::{Credits, KernelName, MotionId, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quadratic voting.
pub const QV_KERNEL: &str = "qv-v1";
/// Quadratic voting with an advisory reward preview for proposal approval.
pub const PROPOSAL_APPROVAL_KERNEL: &str = "pmp-proposal-approval-v1";

/// Per-user contributions and costs produced by a kernel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredVotes {
    /// user -> choice -> contribution to that choice's score.
    pub scores: BTreeMap<User, BTreeMap<String, f64>>,
    /// user -> credits consumed by their current strengths.
    pub costs: BTreeMap<User, Credits>,
}

/// A client-side calculator: a labelled JavaScript function the UI can run to
/// preview the effect of a vote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginCalculator {
    pub label: String,
    pub description: String,
    pub fn_js: String,
}

/// Advisory calculators attached to a tally. Never used for payouts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margin {
    pub cost: MarginCalculator,
    pub impact: MarginCalculator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<MarginCalculator>,
}

/// State of the quadratic kernels, stored in [`Ad::kernel_state`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QvState {
    pub inverse_cost_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounty: Option<Credits>,
    /// Motion this ballot decides, when opened by a motion policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_id: Option<MotionId>,
}

impl QvState {
    pub fn new(inverse_cost_multiplier: f64) -> Self {
        Self {
            inverse_cost_multiplier,
            bounty: None,
            motion_id: None,
        }
    }

    pub fn for_motion(mut self, id: MotionId) -> Self {
        self.motion_id = Some(id);
        self
    }

    pub fn with_bounty(mut self, bounty: Credits) -> Self {
        self.bounty = Some(bounty);
        self
    }

    pub fn validate(&self, kernel: &str) -> Result<(), BallotError> {
        let m = self.inverse_cost_multiplier;
        if !m.is_finite() || m <= 0.0 {
            return Err(BallotError::InvalidKernelState {
                kernel: kernel.to_string(),
                reason: format!("inverse cost multiplier must be finite and positive, got {m}"),
            });
        }
        if let Some(b) = self.bounty {
            if !b.is_finite() || b < 0.0 {
                return Err(BallotError::InvalidKernelState {
                    kernel: kernel.to_string(),
                    reason: format!("bounty must be finite and non-negative, got {b}"),
                });
            }
        }
        Ok(())
    }

    /// Decode and validate the state of `ad`.
    pub fn from_ad(ad: &Ad) -> Result<Self, BallotError> {
        let kernel = ad.kernel.as_str();
        let state: Self = serde_json::from_value(ad.kernel_state.clone()).map_err(|e| {
            BallotError::InvalidKernelState {
                kernel: kernel.to_string(),
                reason: e.to_string(),
            }
        })?;
        state.validate(kernel)?;
        Ok(state)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, BallotError> {
        serde_json::to_value(self).map_err(|e| BallotError::InvalidKernelState {
            kernel: QV_KERNEL.to_string(),
            reason: e.to_string(),
        })
    }

    /// Credits consumed by a set of strengths: Σ s² / multiplier.
    pub fn cost(&self, strengths: &BTreeMap<String, f64>) -> Credits {
        strengths.values().map(|s| s * s).sum::<f64>() / self.inverse_cost_multiplier
    }
}

/// Capability contract of a score kernel.
///
/// `score` and `calc_js` must be pure: identical inputs give identical
/// outputs, with no clock or randomness involved.
pub trait ScoreKernel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a voter may change a vote they already cast.
    fn allows_revision(&self) -> bool;

    /// Reject kernel state that cannot be scored.
    fn validate_state(&self, ad: &Ad) -> Result<(), BallotError>;

    /// Credits consumed by one voter's strengths.
    fn cost(&self, ad: &Ad, strengths: &BTreeMap<String, f64>) -> Result<Credits, BallotError>;

    fn score(&self, ad: &Ad, elections: &AcceptedElections) -> Result<ScoredVotes, BallotError>;

    /// Credits to distribute among supporters of the winning choice.
    fn bounty(&self, ad: &Ad) -> Result<Credits, BallotError>;

    fn calc_js(&self, ad: &Ad, tally: &Tally) -> Result<Margin, BallotError>;
}

/// Quadratic voting: a strength `s` costs `s² / inverse_cost_multiplier`
/// credits and contributes `s` to its choice.
#[derive(Clone, Copy, Debug, Default)]
pub struct QvKernel;

impl QvKernel {
    fn margin(state: &QvState, tally: &Tally) -> Margin {
        let m = state.inverse_cost_multiplier;
        Margin {
            cost: MarginCalculator {
                label: "Cost".into(),
                description: format!(
                    "Credits needed for a vote of a given strength ({} voters so far)",
                    tally.scores_by_user.len()
                ),
                fn_js: format!(
                    "function(voteUser, voteChoice, voteStrength) {{ return (voteStrength * voteStrength) / {m}; }}"
                ),
            },
            impact: MarginCalculator {
                label: "Impact".into(),
                description: "Change in the choice's score from a vote of a given strength".into(),
                fn_js: "function(voteUser, voteChoice, voteStrength) { return voteStrength; }".into(),
            },
            reward: None,
        }
    }
}

impl ScoreKernel for QvKernel {
    fn name(&self) -> &str {
        QV_KERNEL
    }

    fn allows_revision(&self) -> bool {
        true
    }

    fn validate_state(&self, ad: &Ad) -> Result<(), BallotError> {
        QvState::from_ad(ad).map(|_| ())
    }

    fn cost(&self, ad: &Ad, strengths: &BTreeMap<String, f64>) -> Result<Credits, BallotError> {
        Ok(QvState::from_ad(ad)?.cost(strengths))
    }

    fn score(&self, ad: &Ad, elections: &AcceptedElections) -> Result<ScoredVotes, BallotError> {
        let state = QvState::from_ad(ad)?;
        let mut out = ScoredVotes::default();
        for (user, strengths) in &elections.strengths {
            let contributions = strengths
                .iter()
                .filter(|(choice, _)| ad.has_choice(choice))
                .map(|(choice, s)| (choice.clone(), *s))
                .collect();
            out.scores.insert(user.clone(), contributions);
            out.costs.insert(user.clone(), state.cost(strengths));
        }
        Ok(out)
    }

    fn bounty(&self, ad: &Ad) -> Result<Credits, BallotError> {
        Ok(QvState::from_ad(ad)?.bounty.unwrap_or(0.0))
    }

    fn calc_js(&self, ad: &Ad, tally: &Tally) -> Result<Margin, BallotError> {
        Ok(Self::margin(&QvState::from_ad(ad)?, tally))
    }
}

/// Quadratic voting for proposal approval. Scores like [`QvKernel`]; the
/// margin additionally previews a reviewer's reward.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProposalApprovalKernel {
    inner: QvKernel,
}

impl ScoreKernel for ProposalApprovalKernel {
    fn name(&self) -> &str {
        PROPOSAL_APPROVAL_KERNEL
    }

    fn allows_revision(&self) -> bool {
        self.inner.allows_revision()
    }

    fn validate_state(&self, ad: &Ad) -> Result<(), BallotError> {
        self.inner.validate_state(ad)
    }

    fn cost(&self, ad: &Ad, strengths: &BTreeMap<String, f64>) -> Result<Credits, BallotError> {
        self.inner.cost(ad, strengths)
    }

    fn score(&self, ad: &Ad, elections: &AcceptedElections) -> Result<ScoredVotes, BallotError> {
        self.inner.score(ad, elections)
    }

    fn bounty(&self, ad: &Ad) -> Result<Credits, BallotError> {
        self.inner.bounty(ad)
    }

    fn calc_js(&self, ad: &Ad, tally: &Tally) -> Result<Margin, BallotError> {
        let mut margin = self.inner.calc_js(ad, tally)?;
        margin.reward = Some(MarginCalculator {
            label: "Reward".into(),
            description: "Estimated reward if the proposal is approved (preview only)".into(),
            fn_js: "function(voteUser, voteChoice, voteImpact) { return 2*Math.abs(voteImpact); }"
                .into(),
        });
        Ok(margin)
    }
}

/// The closed set of kernels this build knows about.
#[derive(Clone, Copy, Debug)]
pub enum BuiltinKernel {
    Qv(QvKernel),
    ProposalApproval(ProposalApprovalKernel),
}

impl BuiltinKernel {
    fn inner(&self) -> &dyn ScoreKernel {
        match self {
            BuiltinKernel::Qv(k) => k,
            BuiltinKernel::ProposalApproval(k) => k,
        }
    }
}

impl ScoreKernel for BuiltinKernel {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn allows_revision(&self) -> bool {
        self.inner().allows_revision()
    }

    fn validate_state(&self, ad: &Ad) -> Result<(), BallotError> {
        self.inner().validate_state(ad)
    }

    fn cost(&self, ad: &Ad, strengths: &BTreeMap<String, f64>) -> Result<Credits, BallotError> {
        self.inner().cost(ad, strengths)
    }

    fn score(&self, ad: &Ad, elections: &AcceptedElections) -> Result<ScoredVotes, BallotError> {
        self.inner().score(ad, elections)
    }

    fn bounty(&self, ad: &Ad) -> Result<Credits, BallotError> {
        self.inner().bounty(ad)
    }

    fn calc_js(&self, ad: &Ad, tally: &Tally) -> Result<Margin, BallotError> {
        self.inner().calc_js(ad, tally)
    }
}

/// Name -> kernel lookup table. Populated at startup, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct KernelRegistry {
    kernels: BTreeMap<String, BuiltinKernel>,
}

impl KernelRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every built-in kernel.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kernel in [
            BuiltinKernel::Qv(QvKernel),
            BuiltinKernel::ProposalApproval(ProposalApprovalKernel::default()),
        ] {
            registry.kernels.insert(kernel.name().to_string(), kernel);
        }
        registry
    }

    pub fn register(&mut self, kernel: BuiltinKernel) -> Result<(), BallotError> {
        let name = kernel.name().to_string();
        if self.kernels.contains_key(&name) {
            return Err(BallotError::DuplicateKernel(name));
        }
        self.kernels.insert(name, kernel);
        Ok(())
    }

    /// Resolve a kernel. Unknown names are an error, never a default.
    pub fn get(&self, name: &KernelName) -> Result<&BuiltinKernel, BallotError> {
        self.kernels
            .get(name.as_str())
            .ok_or_else(|| BallotError::UnknownKernel(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }
}
