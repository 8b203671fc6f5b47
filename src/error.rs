//! Error types for orderlog-flatten
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::types::RunStage;
use thiserror::Error;

/// The main error type for orderlog-flatten
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("Failed to decode {location}: {message}")]
    Decode { location: String, message: String },

    #[error("Schema violation at {location}, field '{field}': expected {expected}, found {found}")]
    SchemaViolation {
        location: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage unavailable during {operation} '{key}': {source}")]
    StorageUnavailable {
        operation: &'static str,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Consolidation into '{final_key}' left {} transient object(s) behind", remaining.len())]
    ConsolidationIncomplete {
        final_key: String,
        remaining: Vec<String>,
    },

    #[error("Shard '{key}' header does not match first shard header")]
    ShardHeaderMismatch { key: String },

    #[error("Shard '{key}' cannot be consolidated: {reason}")]
    ShardNotConsolidated { key: String, reason: String },

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Run Errors
    // ============================================================================
    #[error("Run failed while {stage}: {source}")]
    Stage {
        stage: RunStage,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a schema violation
    pub fn schema_violation(
        location: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::SchemaViolation {
            location: location.into(),
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Wrap an object store failure
    pub fn storage(operation: &'static str, key: impl Into<String>, source: object_store::Error) -> Self {
        Self::StorageUnavailable {
            operation,
            key: key.into(),
            source,
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Attach the run stage in which this error surfaced
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn at_stage(self, stage: RunStage) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was raised in, if known
    pub fn stage(&self) -> Option<RunStage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Check if this error came from a storage call
    pub fn is_storage(&self) -> bool {
        match self {
            Error::StorageUnavailable { .. } => true,
            Error::Stage { source, .. } => source.is_storage(),
            _ => false,
        }
    }

    /// Check if this error is a schema violation
    pub fn is_schema_violation(&self) -> bool {
        match self {
            Error::SchemaViolation { .. } => true,
            Error::Stage { source, .. } => source.is_schema_violation(),
            _ => false,
        }
    }
}

/// Result type alias for orderlog-flatten
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::schema_violation("logs/a.json:3", "subtotal", "Float64", "string");
        assert_eq!(
            err.to_string(),
            "Schema violation at logs/a.json:3, field 'subtotal': expected Float64, found string"
        );

        let err = Error::ConsolidationIncomplete {
            final_key: "out/output_1.csv".to_string(),
            remaining: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Consolidation into 'out/output_1.csv' left 2 transient object(s) behind"
        );
    }

    #[test]
    fn test_stage_wrapping() {
        let err = Error::schema_violation("x", "tax", "Float64", "string").at_stage(RunStage::Reading);
        assert_eq!(err.stage(), Some(RunStage::Reading));
        assert!(err.is_schema_violation());
        assert!(err.to_string().starts_with("Run failed while Reading"));

        // A second stage does not re-wrap
        let err = err.at_stage(RunStage::Consolidating);
        assert_eq!(err.stage(), Some(RunStage::Reading));
    }

    #[test]
    fn test_is_storage() {
        let source = object_store::Error::NotFound {
            path: "k".to_string(),
            source: "gone".into(),
        };
        let err = Error::storage("copy", "k", source).at_stage(RunStage::Consolidating);
        assert!(err.is_storage());
        assert!(!Error::config("x").is_storage());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
