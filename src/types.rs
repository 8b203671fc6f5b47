//! Common types used throughout orderlog-flatten
//!
//! This module contains small enums shared across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Run Stage
// ============================================================================

/// Stage of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStage {
    Initializing,
    Reading,
    Transforming,
    WritingShards,
    Consolidating,
    Done,
    Failed,
}

impl RunStage {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Done | RunStage::Failed)
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunStage::Initializing => "Initializing",
            RunStage::Reading => "Reading",
            RunStage::Transforming => "Transforming",
            RunStage::WritingShards => "WritingShards",
            RunStage::Consolidating => "Consolidating",
            RunStage::Done => "Done",
            RunStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Input Format
// ============================================================================

/// Layout of JSON records inside an input object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// A single JSON document if the body parses as one, JSON Lines otherwise
    #[default]
    Auto,
    /// One JSON document per object (an array holds many records)
    Json,
    /// One JSON object per line
    Jsonl,
}

// ============================================================================
// Log Level
// ============================================================================

/// Log level for the command-line logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stage_display() {
        assert_eq!(RunStage::WritingShards.to_string(), "WritingShards");
        assert_eq!(RunStage::Consolidating.to_string(), "Consolidating");
    }

    #[test]
    fn test_run_stage_terminal() {
        assert!(RunStage::Done.is_terminal());
        assert!(RunStage::Failed.is_terminal());
        assert!(!RunStage::Reading.is_terminal());
    }

    #[test]
    fn test_input_format_serde() {
        let format: InputFormat = serde_json::from_str("\"jsonl\"").unwrap();
        assert_eq!(format, InputFormat::Jsonl);

        let json = serde_json::to_string(&InputFormat::Auto).unwrap();
        assert_eq!(json, "\"auto\"");
        assert_eq!(InputFormat::default(), InputFormat::Auto);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::default()), tracing::Level::INFO);
    }
}
