//! Pipeline configuration
//!
//! A run is configured from YAML, from CLI flags, or both; flags win.

use crate::error::{Error, Result};
use crate::output::{DEFAULT_RECORDS_PER_SHARD, DEFAULT_SHARD_PATTERN};
use crate::types::InputFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input locator: a storage URL whose key part may hold glob wildcards
    #[serde(default)]
    pub input: String,

    /// Output base URL; run artifacts and the final object go under it
    #[serde(default)]
    pub output: String,

    /// How input objects are decoded
    #[serde(default)]
    pub input_format: InputFormat,

    /// Input records per shard
    #[serde(default = "default_records_per_shard")]
    pub records_per_shard: usize,

    /// Maximum concurrent shard workers (defaults to available parallelism)
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// File-name pattern of data shards under the transient prefix
    #[serde(default = "default_shard_pattern")]
    pub shard_pattern: String,

    /// Fail the run when cleanup leaves transient objects behind
    #[serde(default)]
    pub strict_cleanup: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            input_format: InputFormat::default(),
            records_per_shard: default_records_per_shard(),
            max_workers: None,
            shard_pattern: default_shard_pattern(),
            strict_cleanup: false,
        }
    }
}

fn default_records_per_shard() -> usize {
    DEFAULT_RECORDS_PER_SHARD
}

fn default_shard_pattern() -> String {
    DEFAULT_SHARD_PATTERN.as_str().to_string()
}

impl PipelineConfig {
    /// Create a config for an input locator and output base URL
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Parse a config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_yaml(&content)
    }

    /// Check required fields and limits
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() {
            return Err(Error::config("Missing input locator"));
        }
        if self.output.trim().is_empty() {
            return Err(Error::config("Missing output location"));
        }
        if self.records_per_shard == 0 {
            return Err(Error::invalid_value("records_per_shard", "must be greater than zero"));
        }
        if self.max_workers == Some(0) {
            return Err(Error::invalid_value("max_workers", "must be greater than zero"));
        }
        self.shard_regex()?;
        Ok(())
    }

    /// Compiled shard pattern
    pub fn shard_regex(&self) -> Result<Regex> {
        Regex::new(&self.shard_pattern)
            .map_err(|e| Error::invalid_value("shard_pattern", e.to_string()))
    }

    /// Effective worker limit
    pub fn workers(&self) -> usize {
        self.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
        })
    }
}
