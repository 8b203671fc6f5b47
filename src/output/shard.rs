//! Shard writing
//!
//! A shard writer runs the per-record transform over every input record and
//! persists the rows as one or more CSV shards under a destination prefix.

use super::writer::{encode_rows, CsvWriterConfig};
use crate::error::{Error, Result};
use crate::flatten::{FlatRow, RecordTransform};
use crate::schema::InputRecord;
use crate::types::RunStage;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Default number of input records per shard
pub const DEFAULT_RECORDS_PER_SHARD: usize = 100_000;

/// Marker object written after every shard is durable
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Execution resources for one run, handed to the shard writer per call
///
/// Nothing here outlives the call: worker tasks are spawned into a set
/// owned by `write_shards` and aborted if it returns early.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    store: Arc<dyn ObjectStore>,
    run_id: String,
    max_workers: usize,
    records_per_shard: usize,
    csv: CsvWriterConfig,
}

impl ExecutionContext {
    /// Create a context with default limits
    pub fn new(store: Arc<dyn ObjectStore>, run_id: impl Into<String>) -> Self {
        Self {
            store,
            run_id: run_id.into(),
            max_workers: default_workers(),
            records_per_shard: DEFAULT_RECORDS_PER_SHARD,
            csv: CsvWriterConfig::default(),
        }
    }

    /// Set the maximum number of concurrent shard workers
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Set how many input records go into each shard
    #[must_use]
    pub fn with_records_per_shard(mut self, records: usize) -> Self {
        self.records_per_shard = records.max(1);
        self
    }

    /// Set CSV encoding options
    #[must_use]
    pub fn with_csv(mut self, csv: CsvWriterConfig) -> Self {
        self.csv = csv;
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn records_per_shard(&self) -> usize {
        self.records_per_shard
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// One shard that is durably stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenShard {
    /// Full key of the shard object
    pub key: ObjectPath,
    /// Data rows in the shard (header excluded)
    pub rows: usize,
}

/// Applies a transform to all records and persists the resulting shards
///
/// Contract: every record passes through `transform` exactly once, all rows
/// are durably stored under `destination` before the call returns, and the
/// returned keys are visible to a subsequent list of `destination`.
#[async_trait]
pub trait ShardWriter: Send + Sync {
    async fn write_shards(
        &self,
        ctx: &ExecutionContext,
        records: Vec<InputRecord>,
        transform: Arc<dyn RecordTransform>,
        destination: &ObjectPath,
    ) -> Result<Vec<WrittenShard>>;
}

/// Shard writer that encodes on blocking workers and puts to an object store
///
/// Shards are named `part-{index:05}-{run_id}.csv`. At least one shard is
/// always written, so an input without rows still produces a header.
#[derive(Debug, Clone, Default)]
pub struct ObjectStoreShardWriter {
    skip_success_marker: bool,
}

impl ObjectStoreShardWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not write the `_SUCCESS` marker
    #[must_use]
    pub fn without_success_marker(mut self) -> Self {
        self.skip_success_marker = true;
        self
    }
}

#[async_trait]
impl ShardWriter for ObjectStoreShardWriter {
    async fn write_shards(
        &self,
        ctx: &ExecutionContext,
        records: Vec<InputRecord>,
        transform: Arc<dyn RecordTransform>,
        destination: &ObjectPath,
    ) -> Result<Vec<WrittenShard>> {
        let chunks = chunk_records(records, ctx.records_per_shard);
        debug!(
            "Writing {} shard(s) with up to {} worker(s)",
            chunks.len(),
            ctx.max_workers
        );

        let permits = Arc::new(Semaphore::new(ctx.max_workers));
        let mut workers = JoinSet::new();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let permits = permits.clone();
            let transform = transform.clone();
            let store = ctx.store.clone();
            let csv = ctx.csv.clone();
            let key = shard_key(destination, index, &ctx.run_id);

            workers.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::output(format!("Worker pool closed: {e}")))?;

                let (body, rows) =
                    tokio::task::spawn_blocking(move || encode_chunk(transform.as_ref(), &chunk, &csv))
                        .await
                        .map_err(|e| Error::output(format!("Shard encoder panicked: {e}")))?
                        .map_err(|e| e.at_stage(RunStage::Transforming))?;

                store
                    .put(&key, body.into())
                    .await
                    .map_err(|e| Error::storage("put", key.as_ref(), e))?;

                debug!("Wrote shard {key} with {rows} row(s)");
                Ok::<_, Error>(WrittenShard { key, rows })
            });
        }

        let mut shards = Vec::new();
        while let Some(joined) = workers.join_next().await {
            let shard = joined.map_err(|e| Error::output(format!("Shard task failed: {e}")))??;
            shards.push(shard);
        }

        if !self.skip_success_marker {
            let marker = ObjectPath::from(crate::storage::join_key(destination.as_ref(), SUCCESS_MARKER));
            ctx.store
                .put(&marker, Bytes::new().into())
                .await
                .map_err(|e| Error::storage("put", marker.as_ref(), e))?;
        }

        shards.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(shards)
    }
}

fn shard_key(destination: &ObjectPath, index: usize, run_id: &str) -> ObjectPath {
    ObjectPath::from(crate::storage::join_key(
        destination.as_ref(),
        &format!("part-{index:05}-{run_id}.csv"),
    ))
}

/// Split records into shard-sized chunks, always at least one
fn chunk_records(records: Vec<InputRecord>, size: usize) -> Vec<Vec<InputRecord>> {
    if records.is_empty() {
        return vec![Vec::new()];
    }

    let mut chunks = Vec::with_capacity(records.len().div_ceil(size));
    let mut remaining = records.into_iter().peekable();
    while remaining.peek().is_some() {
        chunks.push(remaining.by_ref().take(size).collect());
    }
    chunks
}

fn encode_chunk(
    transform: &dyn RecordTransform,
    chunk: &[InputRecord],
    csv: &CsvWriterConfig,
) -> Result<(Bytes, usize)> {
    let mut rows: Vec<FlatRow> = Vec::new();
    for record in chunk {
        transform.check(record)?;
        rows.extend(transform.apply(record));
    }
    let body = encode_rows(&transform.output_schema(), &rows, csv)?;
    Ok((body, rows.len()))
}

#[cfg(test)]
pub(crate) fn chunk_sizes(records: Vec<InputRecord>, size: usize) -> Vec<usize> {
    chunk_records(records, size).iter().map(Vec::len).collect()
}
