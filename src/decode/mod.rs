//! Input decoder module
//!
//! Supports: JSON documents, JSON Lines, and auto-detection between them.
//!
//! # Overview
//!
//! Decoders turn the body of one input object into raw JSON records,
//! tagged with their position for error reporting. Validation happens later.

mod decoders;
mod types;

pub use decoders::{AutoDecoder, JsonDecoder, JsonlDecoder};
pub use types::{decoder_for, RawRecord, RecordDecoder};

#[cfg(test)]
mod tests;
