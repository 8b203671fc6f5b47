//! Engine types
//!
//! Run naming and the report produced by a finished run.

use crate::storage::StorageLocation;
use crate::types::RunStage;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use serde::Serialize;

/// Format of run identifiers, second resolution in UTC
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Names derived for one run
///
/// The transient prefix is private to the run, so two runs with distinct
/// ids never touch each other's shards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Run identifier, e.g. `20240501_120000`
    pub run_id: String,
    /// Prefix holding this run's shards until consolidation
    pub transient_prefix: ObjectPath,
    /// Key of the consolidated output object
    pub final_key: ObjectPath,
}

impl Run {
    /// Name a run started at `started` under `output`
    pub fn at(started: DateTime<Utc>, output: &StorageLocation) -> Self {
        Self::named(started.format(RUN_ID_FORMAT).to_string(), output)
    }

    /// Name a run with an explicit identifier
    pub fn named(run_id: impl Into<String>, output: &StorageLocation) -> Self {
        let run_id = run_id.into();
        Self {
            transient_prefix: output.child(&format!("output_tmp_{run_id}")),
            final_key: output.child(&format!("output_{run_id}.csv")),
            run_id,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: String,
    /// Last stage reached
    pub stage: RunStage,
    /// URL of the consolidated object, if one was written
    pub final_location: Option<String>,
    /// Input objects read
    pub objects_read: usize,
    /// Validated input records
    pub records_read: usize,
    /// Flat rows written across all shards
    pub rows_written: usize,
    /// Shards written before consolidation
    pub shards: usize,
    /// Transient objects that cleanup could not remove
    pub leftover: Vec<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Whether the transient prefix was left empty
    pub fn is_clean(&self) -> bool {
        self.leftover.is_empty()
    }
}
