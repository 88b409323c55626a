//! End-to-end runs over the sample customer dataset and script

use std::path::PathBuf;
use std::sync::Arc;

use csvql_core::{Connection, Value};
use csvql_driver_sqlite::SqliteConnection;
use csvql_interchange::{Dataset, TableLoader};
use csvql_query::{
    BatchRunner, FailureKind, RunConfig, RunState, execute_batch, execute_statement,
};
use pretty_assertions::assert_eq;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn sample_config() -> RunConfig {
    let root = workspace_root();
    RunConfig::from_dirs(root.join("data/processed"), root.join("sql"))
}

async fn loaded_store() -> Arc<dyn Connection> {
    let store: Arc<dyn Connection> = Arc::new(SqliteConnection::open_in_memory().unwrap());
    TableLoader::new(store.clone(), "customers")
        .load_file(&sample_config().dataset_path)
        .await
        .unwrap();
    store.set_query_only(true).await.unwrap();
    store
}

#[tokio::test]
async fn test_sample_script_runs_every_statement() {
    let mut runner = BatchRunner::new(sample_config());
    let mut out: Vec<u8> = Vec::new();

    let summary = runner.run(&mut out).await.unwrap();

    assert_eq!(runner.state(), RunState::Done);
    assert_eq!(summary.statements, 5);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.load.rows, 30);

    let report = String::from_utf8(out).unwrap();
    assert_eq!(report.matches("\nResults for query:\n").count(), 5);
    assert!(report.contains("-- Identify top customers by total purchases and loyalty score"));
    assert!(
        report
            .lines()
            .any(|l| l.split_whitespace().collect::<Vec<_>>() == ["30", "3", "0.1"]),
        "{}",
        report
    );
}

#[tokio::test]
async fn test_top_customers_query() {
    let store = loaded_store().await;

    let outcome = execute_statement(
        store.as_ref(),
        "SELECT CustomerID, TotalPurchases, LoyaltyScore FROM customers \
         ORDER BY TotalPurchases DESC, LoyaltyScore DESC LIMIT 10",
    )
    .await;

    let result = outcome.query_result().unwrap();
    assert_eq!(result.row_count(), 10);
    let first = &result.rows[0];
    assert_eq!(first.get(0), Some(&Value::Int64(1005)));
    assert_eq!(first.get(1), Some(&Value::Int64(30)));
    match first.get(2) {
        Some(Value::Float64(loyalty)) => assert!((loyalty - 7.239726).abs() < 1e-9, "{}", loyalty),
        other => panic!("unexpected loyalty score: {:?}", other),
    }
}

#[tokio::test]
async fn test_customer_ids_round_trip_in_load_order() {
    let dataset = Dataset::from_path(&sample_config().dataset_path).unwrap();
    let store = loaded_store().await;

    let outcome = execute_statement(store.as_ref(), "SELECT CustomerID FROM customers").await;

    let loaded: Vec<Value> = outcome
        .query_result()
        .unwrap()
        .rows
        .iter()
        .map(|r| r.values[0].clone())
        .collect();
    let expected = dataset.column("CustomerID").unwrap().values.clone();
    assert_eq!(loaded.len(), dataset.row_count());
    assert_eq!(loaded, expected);
}

#[tokio::test]
async fn test_missing_column_does_not_stop_batch() {
    let store = loaded_store().await;

    let batch = execute_batch(
        store.as_ref(),
        vec![
            "SELECT CustomerTier FROM customers".to_string(),
            "SELECT COUNT(*) FROM customers".to_string(),
        ],
    )
    .await;

    let failure = batch.results[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Engine);
    assert!(failure.message.contains("CustomerTier"), "{}", failure.message);

    let count = batch.results[1].outcome.query_result().unwrap();
    assert_eq!(count.rows[0].get(0), Some(&Value::Int64(30)));
}
