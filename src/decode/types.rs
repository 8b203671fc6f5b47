//! Decoder types and traits
//!
//! Defines the core decoder abstractions.

use super::decoders::{AutoDecoder, JsonDecoder, JsonlDecoder};
use crate::error::Result;
use crate::types::InputFormat;
use serde_json::Value;

/// One parsed JSON value and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line number (JSON Lines) or element number (JSON documents)
    pub position: usize,
    /// The parsed value, not yet validated
    pub value: Value,
}

impl RawRecord {
    pub fn new(position: usize, value: Value) -> Self {
        Self { position, value }
    }
}

/// Trait for decoding object bodies into raw records
pub trait RecordDecoder: Send + Sync {
    /// Decode an object body; `source` names the object in error messages
    fn decode(&self, body: &str, source: &str) -> Result<Vec<RawRecord>>;
}

/// Build the decoder for an input format
pub fn decoder_for(format: InputFormat) -> Box<dyn RecordDecoder> {
    match format {
        InputFormat::Auto => Box::new(AutoDecoder::new()),
        InputFormat::Json => Box::new(JsonDecoder::new()),
        InputFormat::Jsonl => Box::new(JsonlDecoder::new()),
    }
}
