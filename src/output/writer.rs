//! CSV encoder
//!
//! Encodes Arrow RecordBatches as delimited text held in memory.

use super::batch::rows_to_batch;
use crate::error::{Error, Result};
use crate::flatten::FlatRow;
use arrow::csv::WriterBuilder;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;

/// Configuration for the CSV encoder
#[derive(Debug, Clone)]
pub struct CsvWriterConfig {
    delimiter: u8,
    header: bool,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
        }
    }
}

impl CsvWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Enable or disable the header row
    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Get the field delimiter
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Whether a header row is written
    #[must_use]
    pub fn has_header(&self) -> bool {
        self.header
    }
}

/// Encode a batch as CSV
///
/// The header is written even when the batch has no rows.
pub fn encode_csv(batch: &RecordBatch, config: &CsvWriterConfig) -> Result<Bytes> {
    let mut writer = WriterBuilder::new()
        .with_header(config.header)
        .with_delimiter(config.delimiter)
        .build(Vec::new());

    writer.write(batch).map_err(|e| Error::Output {
        message: format!("Failed to write CSV: {e}"),
    })?;

    Ok(Bytes::from(writer.into_inner()))
}

/// Encode flat rows as CSV under the given schema
pub fn encode_rows(schema: &SchemaRef, rows: &[FlatRow], config: &CsvWriterConfig) -> Result<Bytes> {
    let batch = rows_to_batch(schema, rows)?;
    encode_csv(&batch, config)
}
