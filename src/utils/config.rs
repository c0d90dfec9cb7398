//! TOML-based configuration for CORAL
//!
//! This module provides declarative configuration for the research pipeline
//! via a TOML file (`coral.toml`). Every field has a default, so an absent
//! file or an empty table yields a working configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure loaded from coral.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoralConfig {
    /// Scheduler and queue limits.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Tool collaborator settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for CoralConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            tools: ToolsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

// ============= Pipeline Configuration =============

/// Limits for the scheduler, queue, and per-topic iteration budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent research workers; 1 means series mode.
    #[serde(default = "default_max_parallel_topics")]
    pub max_parallel_topics: usize,

    /// Hard cap on the total number of topics a run may create.
    #[serde(default = "default_max_queue_length")]
    pub max_queue_length: usize,

    /// Research iterations each topic may consume before it is failed.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_parallel_topics() -> usize {
    5
}

fn default_max_queue_length() -> usize {
    20
}

fn default_max_iterations() -> u32 {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_parallel_topics: default_max_parallel_topics(),
            max_queue_length: default_max_queue_length(),
            max_iterations: default_max_iterations(),
        }
    }
}

// ============= Tools Configuration =============

/// Settings passed to the built-in tool collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Results requested per search call.
    #[serde(default = "default_num_results")]
    pub num_results: usize,
}

fn default_num_results() -> usize {
    10
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
        }
    }
}

// ============= Logging Configuration =============

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============= Errors and Loading =============

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The offending path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The offending path.
        path: String,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A field value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl CoralConfig {
    /// Loads and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: CoralConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file if present, otherwise defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_parallel_topics == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_parallel_topics must be at least 1".into(),
            ));
        }
        if self.pipeline.max_queue_length == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_queue_length must be at least 1".into(),
            ));
        }
        if self.pipeline.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_iterations must be at least 1".into(),
            ));
        }
        if self.tools.num_results == 0 {
            return Err(ConfigError::Invalid(
                "tools.num_results must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// A commented scaffold for `coral-research init`.
    pub fn scaffold() -> &'static str {
        r#"# CORAL configuration

[pipeline]
# Concurrent research workers; set to 1 for strict series execution.
max_parallel_topics = 5
# Hard cap on the total number of subtopics a run may create.
max_queue_length = 20
# Research iterations per topic before it is marked failed.
max_iterations = 3

[tools]
# Results requested per search call.
num_results = 10

[log]
# Tracing filter used when RUST_LOG is unset.
level = "info"
"#
    }
}
