//! Configuration utilities.

/// TOML-based configuration (`coral.toml`).
pub mod config;

pub use config::{ConfigError, CoralConfig, PipelineConfig};
