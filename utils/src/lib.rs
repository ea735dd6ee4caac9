//! Shared utilities for civitas.

pub mod logging;
pub mod stats;

pub use logging::{init_tracing, parse_level, LogConfigError, LogFormat};
pub use stats::StatsCounter;
