//! Output module
//!
//! Encodes flat rows as CSV shards and consolidates them into one object.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Converting flat rows to Arrow RecordBatches
//! - Writing CSV shards under a transient prefix
//! - Merging shards into the final object and cleaning up the prefix

mod batch;
mod consolidate;
mod shard;
mod writer;

pub use batch::rows_to_batch;
pub use consolidate::{CleanupReport, ConsolidationReport, Consolidator, DEFAULT_SHARD_PATTERN};
pub use shard::{
    ExecutionContext, ObjectStoreShardWriter, ShardWriter, WrittenShard,
    DEFAULT_RECORDS_PER_SHARD, SUCCESS_MARKER,
};
pub use writer::{encode_csv, encode_rows, CsvWriterConfig};
