//! Input reader: resolve, fetch, decode, validate

use crate::decode::{decoder_for, RecordDecoder};
use crate::error::{Error, Result};
use crate::schema::{InputRecord, RecordValidator};
use crate::storage::InputLocator;
use crate::types::InputFormat;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::ObjectMeta;
use tracing::debug;

/// Default number of objects fetched concurrently
const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Records read from every object selected by a locator
#[derive(Debug, Clone, Default)]
pub struct ReadBatch {
    /// Number of input objects read
    pub objects: usize,
    /// Validated records, in key order then position order
    pub records: Vec<InputRecord>,
}

/// Reads and validates all input records of a run
pub struct InputReader {
    locator: InputLocator,
    decoder: Box<dyn RecordDecoder>,
    validator: RecordValidator,
    fetch_concurrency: usize,
}

impl InputReader {
    /// Create a reader for a locator
    pub fn new(locator: InputLocator, format: InputFormat, validator: RecordValidator) -> Self {
        Self {
            locator,
            decoder: decoder_for(format),
            validator,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Set how many objects are fetched at once
    #[must_use]
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    /// The locator this reader resolves
    pub fn locator(&self) -> &InputLocator {
        &self.locator
    }

    /// Read every selected object
    ///
    /// Fails on the first object that cannot be fetched or decoded and on
    /// the first record that violates the schema. Nothing is returned for a
    /// partially valid input.
    pub async fn read_all(&self) -> Result<ReadBatch> {
        let objects = self.locator.resolve().await?;
        debug!(
            "Resolved {} input object(s) for glob '{}'",
            objects.len(),
            self.locator.glob()
        );

        let bodies: Vec<(String, String)> = stream::iter(objects.iter())
            .map(|meta| self.fetch(meta))
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await?;

        let mut batch = ReadBatch {
            objects: bodies.len(),
            records: Vec::new(),
        };

        for (key, body) in &bodies {
            let raw_records = self.decoder.decode(body, key)?;
            debug!("Decoded {} record(s) from {key}", raw_records.len());

            for raw in raw_records {
                let location = format!("{key}:{}", raw.position);
                batch.records.push(self.validator.validate(&raw.value, &location)?);
            }
        }

        Ok(batch)
    }

    async fn fetch(&self, meta: &ObjectMeta) -> Result<(String, String)> {
        let key = meta.location.to_string();
        let store = self.locator.location().store();

        let bytes = store
            .get(&meta.location)
            .await
            .map_err(|e| Error::storage("get", &key, e))?
            .bytes()
            .await
            .map_err(|e| Error::storage("get", &key, e))?;

        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::decode(&key, format!("Object is not valid UTF-8: {e}")))?;

        Ok((key, body))
    }
}

/// Convenience constructor from a locator string
pub fn reader_for(locator: &str, format: InputFormat, validator: RecordValidator) -> Result<InputReader> {
    Ok(InputReader::new(InputLocator::parse(locator)?, format, validator))
}
