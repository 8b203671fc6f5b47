//! Output consolidation
//!
//! Turns the shards under a run's transient prefix into one object at the
//! final key, then removes everything under the prefix.
//!
//! The store has no atomic rename, so relocation is copy then delete. Between
//! the two steps both the final object and the source exist; the final object
//! is already complete at that point and a repeated cleanup finishes the job.

use crate::error::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File names of data-bearing shards
pub static DEFAULT_SHARD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^part-.*\.csv$").expect("shard pattern is a valid regex"));

/// Outcome of one consolidation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationReport {
    /// Destination key
    pub final_key: String,
    /// Whether an object was written to the final key
    pub final_written: bool,
    /// Shards merged into the final object
    pub shards: usize,
    /// Non-data objects found under the prefix
    pub artifacts: usize,
    /// Objects deleted during cleanup
    pub removed: usize,
    /// Objects still under the prefix after cleanup
    pub leftover: Vec<String>,
}

impl ConsolidationReport {
    /// Check if the transient prefix ended up empty
    pub fn is_clean(&self) -> bool {
        self.leftover.is_empty()
    }

    /// Turn leftovers into `ConsolidationIncomplete`
    pub fn ensure_clean(&self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(Error::ConsolidationIncomplete {
                final_key: self.final_key.clone(),
                remaining: self.leftover.clone(),
            })
        }
    }
}

/// Outcome of deleting everything under a prefix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Objects deleted
    pub removed: usize,
    /// Keys that could not be deleted
    pub leftover: Vec<String>,
}

/// Merges shards into a single final object
#[derive(Debug, Clone)]
pub struct Consolidator {
    store: Arc<dyn ObjectStore>,
    shard_pattern: Regex,
}

impl Consolidator {
    /// Create a consolidator matching shards named `part-*.csv`
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            shard_pattern: DEFAULT_SHARD_PATTERN.clone(),
        }
    }

    /// Use a different file-name pattern for data shards
    #[must_use]
    pub fn with_shard_pattern(mut self, pattern: Regex) -> Self {
        self.shard_pattern = pattern;
        self
    }

    /// Check whether a key names a data shard
    pub fn is_shard(&self, key: &ObjectPath) -> bool {
        key.filename()
            .is_some_and(|name| self.shard_pattern.is_match(name))
    }

    /// Consolidate every shard under `transient_prefix` into `final_key`
    ///
    /// The listing is taken once and is trusted to hold every shard. Cleanup
    /// of the prefix runs whether or not relocation succeeded. A relocation
    /// error is returned after cleanup; cleanup leftovers are reported, not
    /// raised.
    pub async fn consolidate(
        &self,
        transient_prefix: &ObjectPath,
        final_key: &ObjectPath,
    ) -> Result<ConsolidationReport> {
        self.consolidate_written(transient_prefix, final_key, &[]).await
    }

    /// Consolidate after a shard writer returned `written`
    ///
    /// Every written key must show up in the listing and match the shard
    /// pattern. Otherwise this fails before anything is relocated or deleted,
    /// so the written shards stay in place.
    pub async fn consolidate_written(
        &self,
        transient_prefix: &ObjectPath,
        final_key: &ObjectPath,
        written: &[ObjectPath],
    ) -> Result<ConsolidationReport> {
        let listing = self.list(transient_prefix).await?;
        let (shards, artifacts): (Vec<ObjectMeta>, Vec<ObjectMeta>) =
            listing.into_iter().partition(|meta| self.is_shard(&meta.location));

        for key in written {
            if shards.iter().any(|meta| &meta.location == key) {
                continue;
            }
            let reason = if artifacts.iter().any(|meta| &meta.location == key) {
                format!("name does not match shard pattern '{}'", self.shard_pattern.as_str())
            } else {
                format!("not listed under {transient_prefix}")
            };
            return Err(Error::ShardNotConsolidated {
                key: key.to_string(),
                reason,
            });
        }

        debug!(
            "Found {} shard(s) and {} other object(s) under {transient_prefix}",
            shards.len(),
            artifacts.len()
        );

        let relocation = self.relocate(&shards, final_key).await;
        let cleanup = self.cleanup(transient_prefix).await;

        let final_written = match relocation {
            Ok(written) => written,
            Err(e) => {
                match &cleanup {
                    Ok(report) if !report.leftover.is_empty() => warn!(
                        "Relocation failed and {} transient object(s) remain under {transient_prefix}",
                        report.leftover.len()
                    ),
                    Err(cleanup_err) => warn!("Relocation failed and cleanup failed too: {cleanup_err}"),
                    Ok(_) => {}
                }
                return Err(e);
            }
        };

        let cleanup = cleanup?;
        if !cleanup.leftover.is_empty() {
            warn!(
                "{} transient object(s) could not be removed from {transient_prefix}",
                cleanup.leftover.len()
            );
        }

        Ok(ConsolidationReport {
            final_key: final_key.to_string(),
            final_written,
            shards: shards.len(),
            artifacts: artifacts.len(),
            removed: cleanup.removed,
            leftover: cleanup.leftover,
        })
    }

    /// Delete every object under a prefix
    ///
    /// Objects that are already gone count as deleted, so this is safe to
    /// repeat. Individual delete failures are collected, not raised.
    pub async fn cleanup(&self, prefix: &ObjectPath) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        for meta in self.list(prefix).await? {
            match self.delete_if_exists(&meta.location).await {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    debug!("Cleanup could not delete {}: {e}", meta.location);
                    report.leftover.push(meta.location.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Place the shards at the final key; returns whether anything was written
    async fn relocate(&self, shards: &[ObjectMeta], final_key: &ObjectPath) -> Result<bool> {
        match shards {
            [] => {
                info!("No shards to consolidate into {final_key}");
                Ok(false)
            }
            [single] => {
                self.store
                    .copy(&single.location, final_key)
                    .await
                    .map_err(|e| Error::storage("copy", single.location.as_ref(), e))?;
                info!("Relocated {} to {final_key}", single.location);
                self.delete_source(&single.location).await;
                Ok(true)
            }
            many => {
                let merged = self.concatenate(many).await?;
                self.store
                    .put(final_key, merged.into())
                    .await
                    .map_err(|e| Error::storage("put", final_key.as_ref(), e))?;
                info!("Merged {} shards into {final_key}", many.len());
                for shard in many {
                    self.delete_source(&shard.location).await;
                }
                Ok(true)
            }
        }
    }

    /// Concatenate shards in key order, keeping the first header only
    async fn concatenate(&self, shards: &[ObjectMeta]) -> Result<Bytes> {
        let mut merged = BytesMut::new();
        let mut header: Option<Bytes> = None;

        for shard in shards {
            let body = self
                .store
                .get(&shard.location)
                .await
                .map_err(|e| Error::storage("get", shard.location.as_ref(), e))?
                .bytes()
                .await
                .map_err(|e| Error::storage("get", shard.location.as_ref(), e))?;

            let (shard_header, rows) = split_header(&body);
            match &header {
                None => {
                    merged.extend_from_slice(shard_header);
                    ensure_newline(&mut merged);
                    header = Some(Bytes::copy_from_slice(shard_header));
                }
                Some(first) if trim_eol(first) != trim_eol(shard_header) => {
                    return Err(Error::ShardHeaderMismatch {
                        key: shard.location.to_string(),
                    });
                }
                Some(_) => {}
            }

            if !rows.is_empty() {
                merged.extend_from_slice(rows);
                ensure_newline(&mut merged);
            }
        }

        Ok(merged.freeze())
    }

    /// Delete a relocated source; failures are left to cleanup
    async fn delete_source(&self, location: &ObjectPath) {
        if let Err(e) = self.delete_if_exists(location).await {
            debug!("Deferring delete of {location} to cleanup: {e}");
        }
    }

    async fn delete_if_exists(&self, location: &ObjectPath) -> Result<()> {
        match self.store.delete(location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::storage("delete", location.as_ref(), e)),
        }
    }

    /// List a prefix in lexicographic key order
    async fn list(&self, prefix: &ObjectPath) -> Result<Vec<ObjectMeta>> {
        let mut listing: Vec<ObjectMeta> = self
            .store
            .list(Some(prefix))
            .try_collect()
            .await
            .map_err(|e| Error::storage("list", prefix.as_ref(), e))?;
        listing.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(listing)
    }
}

/// Split a CSV body into its first line (with line ending) and the rest
fn split_header(body: &[u8]) -> (&[u8], &[u8]) {
    match body.iter().position(|&b| b == b'\n') {
        Some(end) => body.split_at(end + 1),
        None => (body, &[]),
    }
}

fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn ensure_newline(buf: &mut BytesMut) {
    if !buf.is_empty() && !buf.ends_with(b"\n") {
        buf.extend_from_slice(b"\n");
    }
}
