//! Tests for engine module

use super::*;
use crate::error::Error;
use crate::flatten::RecordTransform;
use crate::output::WrittenShard;
use crate::schema::InputRecord;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::TimeZone;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;

const RUN_ID: &str = "20240501_120000";

fn started() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

async fn put(store: &InMemory, key: &str, body: &str) {
    store
        .put(&ObjectPath::from(key), Bytes::from(body.to_string()).into())
        .await
        .unwrap();
}

async fn read(store: &InMemory, key: &str) -> String {
    let bytes = store
        .get(&ObjectPath::from(key))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn keys(store: &InMemory, prefix: &str) -> Vec<String> {
    let mut keys: Vec<String> = store
        .list(Some(&ObjectPath::from(prefix)))
        .map_ok(|meta| meta.location.to_string())
        .try_collect()
        .await
        .unwrap();
    keys.sort();
    keys
}

fn coordinator(store: &Arc<InMemory>, config: PipelineConfig) -> RunCoordinator {
    let input = InputLocator::new(StorageLocation::in_memory(store.clone(), "logs"), "*.json").unwrap();
    let output = StorageLocation::in_memory(store.clone(), "out");
    RunCoordinator::new(config, input, output, ObjectStoreShardWriter::new()).with_start_time(started())
}

fn config() -> PipelineConfig {
    PipelineConfig::new("memory://logs/*.json", "memory://out")
}

/// Writes nothing and fails
struct FailingWriter;

#[async_trait]
impl ShardWriter for FailingWriter {
    async fn write_shards(
        &self,
        _ctx: &ExecutionContext,
        _records: Vec<InputRecord>,
        _transform: Arc<dyn RecordTransform>,
        _destination: &ObjectPath,
    ) -> Result<Vec<WrittenShard>> {
        Err(Error::output("disk full"))
    }
}

/// Writes two shards whose headers disagree
struct MismatchedWriter;

#[async_trait]
impl ShardWriter for MismatchedWriter {
    async fn write_shards(
        &self,
        ctx: &ExecutionContext,
        _records: Vec<InputRecord>,
        _transform: Arc<dyn RecordTransform>,
        destination: &ObjectPath,
    ) -> Result<Vec<WrittenShard>> {
        let mut shards = Vec::new();
        for (name, body) in [("part-00000.csv", "a,b\n1,2\n"), ("part-00001.csv", "a,c\n3,4\n")] {
            let key = ObjectPath::from(format!("{destination}/{name}"));
            ctx.store()
                .put(&key, Bytes::from_static(body.as_bytes()).into())
                .await
                .unwrap();
            shards.push(WrittenShard { key, rows: 1 });
        }
        Ok(shards)
    }
}

/// Reports a shard it never stored
struct UnlistedWriter;

#[async_trait]
impl ShardWriter for UnlistedWriter {
    async fn write_shards(
        &self,
        _ctx: &ExecutionContext,
        _records: Vec<InputRecord>,
        _transform: Arc<dyn RecordTransform>,
        destination: &ObjectPath,
    ) -> Result<Vec<WrittenShard>> {
        Ok(vec![WrittenShard {
            key: ObjectPath::from(format!("{destination}/part-00000.csv")),
            rows: 1,
        }])
    }
}

// ============================================================================
// Run Naming Tests
// ============================================================================

#[test]
fn test_run_naming() {
    let output = StorageLocation::in_memory(Arc::new(InMemory::new()), "warehouse/flat/");
    let run = Run::at(started(), &output);

    assert_eq!(run.run_id, RUN_ID);
    assert_eq!(
        run.transient_prefix,
        ObjectPath::from("warehouse/flat/output_tmp_20240501_120000")
    );
    assert_eq!(
        run.final_key,
        ObjectPath::from("warehouse/flat/output_20240501_120000.csv")
    );
}

#[test]
fn test_distinct_runs_have_distinct_prefixes() {
    let output = StorageLocation::in_memory(Arc::new(InMemory::new()), "out");
    let a = Run::named("a", &output);
    let b = Run::named("b", &output);
    assert_ne!(a.transient_prefix, b.transient_prefix);
    assert_ne!(a.final_key, b.final_key);
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test]
async fn test_run_single_order() {
    let store = Arc::new(InMemory::new());
    put(
        &store,
        "logs/orders.json",
        r#"{"order_id": "O1", "currency": "USD", "customer": {"customer_id": 7, "email": "a@b.c"},
            "products": [{"product_id": 1, "name": "Pen", "price": 1.5},
                         {"product_id": 2, "name": "Ink", "price": 4.0}]}"#,
    )
    .await;

    let report = coordinator(&store, config()).run().await.unwrap();

    assert_eq!(report.run_id, RUN_ID);
    assert_eq!(report.stage, RunStage::Done);
    assert_eq!(
        report.final_location.as_deref(),
        Some("memory://out/output_20240501_120000.csv")
    );
    assert_eq!(report.objects_read, 1);
    assert_eq!(report.records_read, 1);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.shards, 1);
    assert!(report.is_clean());

    assert_eq!(keys(&store, "out").await, vec!["out/output_20240501_120000.csv"]);

    let text = read(&store, "out/output_20240501_120000.csv").await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("currency,order_id,"));
    assert!(lines[1].starts_with("USD,O1,"));
    assert!(lines[1].contains("a@b.c"));
    assert!(lines[1].contains("Pen"));
    assert!(lines[2].contains("Ink"));
}

#[tokio::test]
async fn test_run_orders_without_products() {
    let store = Arc::new(InMemory::new());
    put(
        &store,
        "logs/orders.json",
        "{\"order_id\": \"O1\", \"products\": []}\n{\"order_id\": \"O2\"}\n",
    )
    .await;

    let report = coordinator(&store, config()).run().await.unwrap();

    assert_eq!(report.records_read, 2);
    assert_eq!(report.rows_written, 0);
    let text = read(&store, "out/output_20240501_120000.csv").await;
    assert_eq!(text.lines().count(), 1);
    assert!(keys(&store, "out/output_tmp_20240501_120000").await.is_empty());
}

#[tokio::test]
async fn test_run_many_shards_consolidated() {
    let store = Arc::new(InMemory::new());
    let products = |n: usize| {
        (0..n)
            .map(|i| format!("{{\"product_id\": {i}}}"))
            .collect::<Vec<_>>()
            .join(",")
    };
    put(
        &store,
        "logs/orders.json",
        &format!(
            "{{\"order_id\": \"O1\", \"products\": [{}]}}\n{{\"order_id\": \"O2\", \"products\": [{}]}}\n",
            products(3),
            products(5)
        ),
    )
    .await;

    let mut config = config();
    config.records_per_shard = 1;
    config.max_workers = Some(2);
    let report = coordinator(&store, config).run().await.unwrap();

    assert_eq!(report.shards, 2);
    assert_eq!(report.rows_written, 8);

    let text = read(&store, "out/output_20240501_120000.csv").await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 9);
    assert_eq!(lines.iter().filter(|l| l.starts_with("currency,")).count(), 1);
    assert!(lines[1..4].iter().all(|l| l.contains(",O1,")));
    assert!(lines[4..].iter().all(|l| l.contains(",O2,")));
    assert_eq!(keys(&store, "out").await, vec!["out/output_20240501_120000.csv"]);
}

#[tokio::test]
async fn test_schema_violation_fails_in_reading() {
    let store = Arc::new(InMemory::new());
    put(
        &store,
        "logs/orders.json",
        "{\"order_id\": \"O1\", \"products\": [{\"product_id\": 1}]}\n{\"order_id\": \"O2\", \"subtotal\": \"12.50\"}\n",
    )
    .await;

    let err = coordinator(&store, config()).run().await.unwrap_err();

    assert_eq!(err.stage(), Some(RunStage::Reading));
    assert!(err.is_schema_violation());
    assert!(keys(&store, "out").await.is_empty());
}

#[tokio::test]
async fn test_writer_failure_names_stage() {
    let store = Arc::new(InMemory::new());
    put(&store, "logs/orders.json", "{\"order_id\": \"O1\"}").await;

    let err = coordinator(&store, config())
        .with_writer(FailingWriter)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(RunStage::WritingShards));
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test]
async fn test_consolidation_failure_still_cleans_up() {
    let store = Arc::new(InMemory::new());
    put(&store, "logs/orders.json", "{\"order_id\": \"O1\"}").await;

    let err = coordinator(&store, config())
        .with_writer(MismatchedWriter)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(RunStage::Consolidating));
    match err {
        Error::Stage { source, .. } => {
            assert!(matches!(*source, Error::ShardHeaderMismatch { .. }));
        }
        other => panic!("Expected Stage error, got {other:?}"),
    }
    assert!(keys(&store, "out").await.is_empty());
}

#[tokio::test]
async fn test_shard_pattern_mismatch_keeps_shards() {
    let store = Arc::new(InMemory::new());
    put(
        &store,
        "logs/orders.json",
        "{\"order_id\": \"O1\", \"products\": [{\"product_id\": 1}]}",
    )
    .await;

    let mut config = config();
    config.shard_pattern = r"^chunk_.*\.csv$".to_string();
    let err = coordinator(&store, config).run().await.unwrap_err();

    assert_eq!(err.stage(), Some(RunStage::Consolidating));
    match err {
        Error::Stage { source, .. } => match *source {
            Error::ShardNotConsolidated { key, .. } => {
                assert_eq!(key, "out/output_tmp_20240501_120000/part-00000-20240501_120000.csv");
            }
            other => panic!("Expected ShardNotConsolidated, got {other:?}"),
        },
        other => panic!("Expected Stage error, got {other:?}"),
    }
    assert_eq!(
        keys(&store, "out").await,
        vec![
            "out/output_tmp_20240501_120000/_SUCCESS",
            "out/output_tmp_20240501_120000/part-00000-20240501_120000.csv",
        ]
    );
}

#[tokio::test]
async fn test_unlisted_shard_fails_consolidation() {
    let store = Arc::new(InMemory::new());
    put(&store, "logs/orders.json", "{\"order_id\": \"O1\"}").await;

    let err = coordinator(&store, config())
        .with_writer(UnlistedWriter)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(RunStage::Consolidating));
    match err {
        Error::Stage { source, .. } => {
            assert!(matches!(*source, Error::ShardNotConsolidated { .. }));
        }
        other => panic!("Expected Stage error, got {other:?}"),
    }
    assert!(keys(&store, "out/output_20240501_120000.csv").await.is_empty());
}

#[tokio::test]
async fn test_from_config_rejects_invalid() {
    let err = RunCoordinator::from_config(PipelineConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_from_config_with_empty_input() {
    let coordinator = RunCoordinator::from_config(config())
        .unwrap()
        .with_start_time(started());
    assert_eq!(coordinator.config().records_per_shard, 100_000);

    let report = coordinator.run().await.unwrap();
    assert_eq!(report.objects_read, 0);
    assert_eq!(report.rows_written, 0);
    assert_eq!(
        report.final_location.as_deref(),
        Some("memory://out/output_20240501_120000.csv")
    );
}
