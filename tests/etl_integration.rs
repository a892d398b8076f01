//! Integration tests for the tabload pipeline
//!
//! These run the full Extract, Transform, Load flow from a file on disk into
//! an in-memory SQLite table.

use sqlx::{Executor, Row};
use std::sync::Arc;
use tabload::client::DatabaseClient;
use tabload::config::{RunConfig, RunId};
use tabload::etl::Pipeline;
use tabload::storage::{CsvReader, DirectoryStore, IntermediateStore, MemoryStore};
use tabload::transform::Normalizer;
use tabload::warehouse::TableLoader;
use tempfile::TempDir;

struct Fixture {
    staging: TempDir,
    client: DatabaseClient,
}

impl Fixture {
    async fn new(ddl: &str) -> Self {
        let client = DatabaseClient::connect("sqlite::memory:").await.unwrap();
        client.pool().execute(ddl).await.unwrap();
        Self {
            staging: TempDir::new().unwrap(),
            client,
        }
    }

    fn stage_file(&self, name: &str, content: &str) {
        std::fs::write(self.staging.path().join(name), content).unwrap();
    }

    fn pipeline(
        &self,
        store: Arc<dyn IntermediateStore>,
    ) -> Pipeline<CsvReader, Normalizer, TableLoader> {
        Pipeline::new(
            CsvReader::new(self.staging.path()),
            Normalizer::default(),
            TableLoader::new(self.client.clone()),
            store,
        )
    }

    async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.client.pool())
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_sales_file_lands_with_nulls() {
    let fixture = Fixture::new("CREATE TABLE sales (deal_id INTEGER, sale_price INTEGER)").await;
    fixture.stage_file("sales.csv", "Deal ID,Sale Price\n1,100\n2,\n");

    let store = Arc::new(MemoryStore::new());
    let run = RunId::parse("sales-2024-01-01").unwrap();
    let loaded = fixture
        .pipeline(store.clone())
        .run(&run, &RunConfig::new("sales.csv", "sales"))
        .await
        .unwrap();
    assert_eq!(loaded, 2);

    let rows = sqlx::query("SELECT deal_id, sale_price FROM sales ORDER BY deal_id")
        .fetch_all(fixture.client.pool())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].try_get::<i64, _>("deal_id").unwrap(), 1);
    assert_eq!(rows[0].try_get::<Option<i64>, _>("sale_price").unwrap(), Some(100));
    assert_eq!(rows[1].try_get::<i64, _>("deal_id").unwrap(), 2);
    assert_eq!(rows[1].try_get::<Option<i64>, _>("sale_price").unwrap(), None);

    // Run state is gone once the run finishes
    assert_eq!(store.count(&run), 0);
}

#[tokio::test]
async fn test_row_count_grows_by_input_rows() {
    let fixture = Fixture::new("CREATE TABLE events (id INTEGER, kind TEXT)").await;
    fixture
        .client
        .pool()
        .execute("INSERT INTO events (id, kind) VALUES (0, 'seed')")
        .await
        .unwrap();

    let mut content = String::from("id,kind\n");
    for i in 1..=250 {
        content.push_str(&format!("{},click\n", i));
    }
    fixture.stage_file("events.csv", &content);

    let loaded = fixture
        .pipeline(Arc::new(MemoryStore::new()))
        .run(&RunId::generate(), &RunConfig::new("events.csv", "events"))
        .await
        .unwrap();
    assert_eq!(loaded, 250);
    assert_eq!(fixture.count("events").await, 251);
}

#[tokio::test]
async fn test_unknown_column_commits_nothing() {
    let fixture = Fixture::new("CREATE TABLE sales (deal_id INTEGER)").await;
    fixture.stage_file("sales.csv", "Deal ID,Colour\n1,red\n2,blue\n");

    let store = Arc::new(MemoryStore::new());
    let run = RunId::generate();
    let err = fixture
        .pipeline(store.clone())
        .run(&run, &RunConfig::new("sales.csv", "sales"))
        .await
        .unwrap_err();

    assert!(err.is_load());
    assert_eq!(err.stage(), tabload::Stage::Load);
    assert_eq!(fixture.count("sales").await, 0);
    assert_eq!(store.count(&run), 0);
}

#[tokio::test]
async fn test_failed_widening_does_not_block_insert() {
    // SQLite rejects ALTER COLUMN ... TYPE, so every widening attempt fails
    let fixture = Fixture::new("CREATE TABLE orders (order_id INTEGER, total REAL)").await;
    fixture.stage_file("orders.csv", "Order ID,Total\n7,19.5\n8,3\n");

    let loaded = fixture
        .pipeline(Arc::new(MemoryStore::new()))
        .run(&RunId::generate(), &RunConfig::new("orders.csv", "orders"))
        .await
        .unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(fixture.count("orders").await, 2);
}

#[tokio::test]
async fn test_null_markers_become_sql_null() {
    let fixture = Fixture::new("CREATE TABLE people (name TEXT, age INTEGER)").await;
    fixture.stage_file("people.csv", "Name,Age\nAda,36\nN/A,NaN\nGrace,NULL\n");

    fixture
        .pipeline(Arc::new(MemoryStore::new()))
        .run(&RunId::generate(), &RunConfig::new("people.csv", "people"))
        .await
        .unwrap();

    let nulls = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM people WHERE name IS NULL OR age IS NULL",
    )
    .fetch_one(fixture.client.pool())
    .await
    .unwrap();
    assert_eq!(nulls, 2);
}

#[tokio::test]
async fn test_text_columns_keep_their_digits() {
    let fixture = Fixture::new("CREATE TABLE codes (code TEXT, big TEXT)").await;
    fixture.stage_file("codes.csv", "code,big\n007,99999999999999999999\nABC,x\n");

    fixture
        .pipeline(Arc::new(MemoryStore::new()))
        .run(&RunId::generate(), &RunConfig::new("codes.csv", "codes"))
        .await
        .unwrap();

    let rows = sqlx::query("SELECT code, big FROM codes ORDER BY code")
        .fetch_all(fixture.client.pool())
        .await
        .unwrap();
    let stored: Vec<(String, String)> = rows
        .iter()
        .map(|row| (row.try_get("code").unwrap(), row.try_get("big").unwrap()))
        .collect();
    assert_eq!(
        stored,
        vec![
            ("007".to_string(), "99999999999999999999".to_string()),
            ("ABC".to_string(), "x".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_missing_file_is_configuration_error() {
    let fixture = Fixture::new("CREATE TABLE sales (deal_id INTEGER)").await;

    let err = fixture
        .pipeline(Arc::new(MemoryStore::new()))
        .run(&RunId::generate(), &RunConfig::new("absent.csv", "sales"))
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.stage(), tabload::Stage::Extract);
}

#[tokio::test]
async fn test_stages_across_directory_store() {
    let fixture = Fixture::new("CREATE TABLE sales (deal_id INTEGER, market TEXT)").await;
    fixture.stage_file("sales.csv", "Deal ID,Market\n1,O'Hare\n");
    let runs = TempDir::new().unwrap();
    let run = RunId::parse("scheduled__2024-05-01T00:00:00+00:00").unwrap();

    // Each stage gets its own pipeline, as separate processes would
    let store = || -> Arc<dyn IntermediateStore> { Arc::new(DirectoryStore::new(runs.path()).unwrap()) };
    fixture
        .pipeline(store())
        .extract(&run, &RunConfig::new("sales.csv", "sales"))
        .await
        .unwrap();
    fixture.pipeline(store()).transform(&run).await.unwrap();
    assert_eq!(fixture.pipeline(store()).load(&run).await.unwrap(), 1);

    let market = sqlx::query_scalar::<_, String>("SELECT market FROM sales")
        .fetch_one(fixture.client.pool())
        .await
        .unwrap();
    assert_eq!(market, "O'Hare");

    store().discard(&run).unwrap();
    assert!(store().get(&run, "table").is_err());
}
