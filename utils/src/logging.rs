//! Structured logging initialization via `tracing`.

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LogConfigError {
    #[error("unknown log format {0:?}; expected \"human\" or \"json\"")]
    UnknownFormat(String),

    #[error("invalid log level {level:?}: {reason}")]
    InvalidLevel { level: String, reason: String },
}

/// Output format of the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    /// Parse a config value: `"human"` or `"json"`, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, LogConfigError> {
        if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else if s.eq_ignore_ascii_case("human") {
            Ok(LogFormat::Human)
        } else {
            Err(LogConfigError::UnknownFormat(s.to_string()))
        }
    }
}

impl FromStr for LogFormat {
    type Err = LogConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse a level filter such as `"info"` or `"civitas_governance=debug,warn"`.
///
/// A directive without `=` must be a level name. `EnvFilter` alone would read
/// a bare word as a target, so a typo like `"verbose"` is rejected here.
pub fn parse_level(level: &str) -> Result<EnvFilter, LogConfigError> {
    let invalid = |reason: String| LogConfigError::InvalidLevel {
        level: level.to_string(),
        reason,
    };
    if level.trim().is_empty() {
        return Err(invalid("empty filter".into()));
    }
    for directive in level.split(',').map(str::trim) {
        if directive.is_empty() {
            return Err(invalid("empty directive".into()));
        }
        if !directive.contains('=') && LevelFilter::from_str(directive).is_err() {
            return Err(invalid(format!("{directive:?} is not a level")));
        }
    }
    EnvFilter::try_new(level).map_err(|e| invalid(e.to_string()))
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level` is used and must parse.
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Calling this twice is harmless: the second install attempt is ignored.
pub fn init_tracing(format: LogFormat, level: &str) -> Result<(), LogConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_level(level)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // a subscriber may already be installed (tests, repeated init)
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Human => builder.try_init(),
    };
    Ok(())
}
