//! Execution engine module
//!
//! Drives one run from input locator to consolidated output.
//!
//! # Overview
//!
//! The engine module provides:
//! - `RunCoordinator` - Sequences reading, shard writing and consolidation
//! - `Run` - Run id, transient prefix and final key of one run
//! - `RunReport` - What a finished run produced
//!
//! A run moves through `Initializing -> Reading -> Transforming ->
//! WritingShards -> Consolidating -> Done`. The first failing collaborator
//! halts it; the error carries the stage it surfaced in.

mod types;

pub use types::{Run, RunReport, RUN_ID_FORMAT};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::flatten::FlattenPlan;
use crate::input::InputReader;
use crate::output::{Consolidator, ExecutionContext, ObjectStoreShardWriter, ShardWriter};
use crate::schema::RecordValidator;
use crate::storage::{InputLocator, StorageLocation};
use crate::types::RunStage;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Coordinates a single flattening run
pub struct RunCoordinator<W = ObjectStoreShardWriter> {
    /// Pipeline configuration
    config: PipelineConfig,
    /// Where input records are read from
    input: InputLocator,
    /// Where shards and the final object go
    output: StorageLocation,
    /// Shard writer used for the transform and shard stages
    writer: W,
    /// Fixed start time, used for run naming instead of the clock
    started_at: Option<DateTime<Utc>>,
}

impl RunCoordinator {
    /// Build a coordinator from configuration, opening both locations
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let input = InputLocator::parse(&config.input)?;
        let output = StorageLocation::parse_output(&config.output)?;
        Ok(Self::new(config, input, output, ObjectStoreShardWriter::new()))
    }
}

impl<W: ShardWriter> RunCoordinator<W> {
    /// Create a coordinator over already-opened locations
    pub fn new(config: PipelineConfig, input: InputLocator, output: StorageLocation, writer: W) -> Self {
        Self {
            config,
            input,
            output,
            writer,
            started_at: None,
        }
    }

    /// Replace the shard writer
    pub fn with_writer<V: ShardWriter>(self, writer: V) -> RunCoordinator<V> {
        RunCoordinator {
            config: self.config,
            input: self.input,
            output: self.output,
            writer,
            started_at: self.started_at,
        }
    }

    /// Name the run after a fixed start time
    #[must_use]
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the run
    ///
    /// On failure the returned error is `Error::Stage` naming the stage that
    /// failed. Shards already written are not rolled back.
    pub async fn run(&self) -> Result<RunReport> {
        let mut stage = RunStage::Initializing;
        match self.execute(&mut stage).await {
            Ok(report) => Ok(report),
            Err(e) => {
                let e = e.at_stage(stage);
                error!(
                    "Run failed in stage {}: {e}",
                    e.stage().unwrap_or(RunStage::Failed)
                );
                Err(e)
            }
        }
    }

    async fn execute(&self, stage: &mut RunStage) -> Result<RunReport> {
        let start = Instant::now();

        enter(stage, RunStage::Initializing);
        let run = Run::at(self.started_at.unwrap_or_else(Utc::now), &self.output);
        let plan = FlattenPlan::for_orders()?;
        let validator = RecordValidator::new(plan.input_schema().clone())?;
        let consolidator =
            Consolidator::new(self.output.store().clone()).with_shard_pattern(self.config.shard_regex()?);
        info!(
            "Run {} reading {} into {}",
            run.run_id,
            self.config.input,
            self.output.url_for(&run.final_key)
        );

        enter(stage, RunStage::Reading);
        let reader = InputReader::new(self.input.clone(), self.config.input_format, validator);
        let batch = reader.read_all().await?;
        let objects_read = batch.objects;
        let records_read = batch.records.len();
        info!("Read {records_read} record(s) from {objects_read} object(s)");

        enter(stage, RunStage::Transforming);
        let ctx = ExecutionContext::new(self.output.store().clone(), run.run_id.clone())
            .with_max_workers(self.config.workers())
            .with_records_per_shard(self.config.records_per_shard);

        enter(stage, RunStage::WritingShards);
        let shards = self
            .writer
            .write_shards(&ctx, batch.records, Arc::new(plan), &run.transient_prefix)
            .await?;
        let rows_written = shards.iter().map(|shard| shard.rows).sum();
        info!("Wrote {rows_written} row(s) in {} shard(s)", shards.len());

        enter(stage, RunStage::Consolidating);
        let written: Vec<ObjectPath> = shards.iter().map(|shard| shard.key.clone()).collect();
        let consolidation = consolidator
            .consolidate_written(&run.transient_prefix, &run.final_key, &written)
            .await?;
        if let (Some(first), false) = (written.first(), consolidation.final_written) {
            return Err(Error::ShardNotConsolidated {
                key: first.to_string(),
                reason: format!("no object was written to {}", run.final_key),
            });
        }
        if !consolidation.is_clean() {
            warn!(
                "Leftover transient objects under {}: {:?}",
                run.transient_prefix, consolidation.leftover
            );
            if self.config.strict_cleanup {
                consolidation.ensure_clean()?;
            }
        }

        enter(stage, RunStage::Done);
        let final_location = consolidation
            .final_written
            .then(|| self.output.url_for(&run.final_key));
        if let Some(location) = &final_location {
            info!("Run {} complete: {location}", run.run_id);
        }

        Ok(RunReport {
            run_id: run.run_id,
            stage: RunStage::Done,
            final_location,
            objects_read,
            records_read,
            rows_written,
            shards: shards.len(),
            leftover: consolidation.leftover,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn enter(current: &mut RunStage, next: RunStage) {
    *current = next;
    info!("Stage: {next}");
}

#[cfg(test)]
mod tests;
