//! Orchestrator configuration with TOML file support.

use crate::GovError;
use civitas_policy::PolicyConfig;
use civitas_types::Credits;
use civitas_utils::{parse_level, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a civitas community.
///
/// Can be loaded from a TOML file via [`GovConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovConfig {
    /// Branch holding public community state.
    #[serde(default = "default_community_branch")]
    pub community_branch: String,

    /// Branch holding private credentials.
    #[serde(default = "default_private_branch")]
    pub private_branch: String,

    /// Further attempts after a conflicting push before giving up.
    #[serde(default = "default_max_push_retries")]
    pub max_push_retries: u32,

    /// `m` in the quadratic cost `sum(s^2) / m`.
    #[serde(default = "default_inverse_cost_multiplier")]
    pub inverse_cost_multiplier: f64,

    /// Credits split among supporters of an approved proposal.
    #[serde(default)]
    pub proposal_bounty: Credits,

    /// Data directory for the LMDB store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_community_branch() -> String {
    "main".to_string()
}

fn default_private_branch() -> String {
    "private".to_string()
}

fn default_max_push_retries() -> u32 {
    5
}

fn default_inverse_cost_multiplier() -> f64 {
    1.0
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./civitas_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GovError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| GovError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovError> {
        let config: Self = toml::from_str(s).map_err(|e| GovError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovError> {
        toml::to_string_pretty(self).map_err(|e| GovError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GovError> {
        if self.community_branch.is_empty() || self.private_branch.is_empty() {
            return Err(GovError::Config("branch names must not be empty".into()));
        }
        if self.community_branch == self.private_branch {
            return Err(GovError::Config(
                "community and private branches must differ".into(),
            ));
        }
        if !(self.inverse_cost_multiplier.is_finite() && self.inverse_cost_multiplier > 0.0) {
            return Err(GovError::Config(format!(
                "inverse_cost_multiplier must be positive, got {}",
                self.inverse_cost_multiplier
            )));
        }
        if !(self.proposal_bounty.is_finite() && self.proposal_bounty >= 0.0) {
            return Err(GovError::Config(format!(
                "proposal_bounty must be non-negative, got {}",
                self.proposal_bounty
            )));
        }
        self.log_format()?;
        parse_level(&self.log_level).map_err(|e| GovError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, GovError> {
        LogFormat::parse(&self.log_format).map_err(|e| GovError::Config(e.to_string()))
    }

    pub fn policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            inverse_cost_multiplier: self.inverse_cost_multiplier,
            proposal_bounty: self.proposal_bounty,
        }
    }
}

impl Default for GovConfig {
    fn default() -> Self {
        Self {
            community_branch: default_community_branch(),
            private_branch: default_private_branch(),
            max_push_retries: default_max_push_retries(),
            inverse_cost_multiplier: default_inverse_cost_multiplier(),
            proposal_bounty: 0.0,
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = GovConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = GovConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = GovConfig::from_toml_str("").unwrap();
        assert_eq!(config.community_branch, "main");
        assert_eq!(config.private_branch, "private");
        assert_eq!(config.max_push_retries, 5);
        assert_eq!(config.inverse_cost_multiplier, 1.0);
        assert_eq!(config.data_dir, PathBuf::from("./civitas_data"));
    }

    #[test]
    fn partial_toml_overrides() {
        let config = GovConfig::from_toml_str(
            r#"
            max_push_retries = 2
            proposal_bounty = 25.0
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_push_retries, 2);
        assert_eq!(config.policy_config().proposal_bounty, 25.0);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            GovConfig::from_toml_str("inverse_cost_multiplier = 0.0"),
            Err(GovError::Config(_))
        ));
        assert!(matches!(
            GovConfig::from_toml_str("private_branch = \"main\""),
            Err(GovError::Config(_))
        ));
        assert!(matches!(
            GovConfig::from_toml_str("max_push_retries = \"lots\""),
            Err(GovError::Config(_))
        ));
    }

    #[test]
    fn rejects_unknown_log_settings() {
        assert!(matches!(
            GovConfig::from_toml_str("log_format = \"jsn\""),
            Err(GovError::Config(msg)) if msg.contains("jsn")
        ));
        assert!(matches!(
            GovConfig::from_toml_str("log_level = \"verbose\""),
            Err(GovError::Config(msg)) if msg.contains("verbose")
        ));
        let config = GovConfig::from_toml_str("log_format = \"JSON\"\nlog_level = \"warn,civitas_ballot=debug\"").unwrap();
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civitas.toml");
        std::fs::write(&path, "community_branch = \"trunk\"\n").unwrap();
        let config = GovConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.community_branch, "trunk");
        assert!(GovConfig::from_toml_file(dir.path().join("missing.toml")).is_err());
    }
}
