//! Decoder implementations
//!
//! Each decoder handles one layout of JSON records inside an object.

use super::types::{RawRecord, RecordDecoder};
use crate::error::{Error, Result};
use serde_json::Value;

// ============================================================================
// JSON Decoder
// ============================================================================

/// Whole-body JSON decoder
///
/// An object body is one record; an array body holds one record per element.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str, source: &str) -> Result<Vec<RawRecord>> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::decode(source, format!("Failed to parse JSON: {e}")))?;
        Ok(split_document(value))
    }
}

fn split_document(value: Value) -> Vec<RawRecord> {
    match value {
        Value::Array(elements) => elements
            .into_iter()
            .enumerate()
            .map(|(i, v)| RawRecord::new(i + 1, v))
            .collect(),
        other => vec![RawRecord::new(1, other)],
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonlDecoder {
    fn decode(&self, body: &str, source: &str) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| {
                Error::decode(
                    source,
                    format!("Failed to parse JSONL at line {}: {e}", line_num + 1),
                )
            })?;

            records.push(RawRecord::new(line_num + 1, value));
        }

        Ok(records)
    }
}

// ============================================================================
// Auto Decoder
// ============================================================================

/// Accepts either layout
///
/// A body that parses as a single JSON document is decoded like
/// [`JsonDecoder`]; anything else is treated as JSON Lines, so parse errors
/// point at the offending line.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecoder;

impl AutoDecoder {
    /// Create a new auto-detecting decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for AutoDecoder {
    fn decode(&self, body: &str, source: &str) -> Result<Vec<RawRecord>> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => Ok(split_document(value)),
            Err(_) => JsonlDecoder.decode(body, source),
        }
    }
}
