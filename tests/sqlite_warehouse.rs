//! Pipeline runs against a real SQLite file through the `sqlx` Any driver

mod common;

use common::seeded_store;
use retail_star_etl::etl::Pipeline;
use retail_star_etl::warehouse::{Dialect, SqlWarehouse};
use retail_star_etl::{PipelineConfig, StarSchemaTransformer, Warehouse};
use sqlx::Row;
use tempfile::TempDir;

fn sqlite_warehouse(dir: &TempDir, batch_size: usize) -> SqlWarehouse {
    let path = dir.path().join("warehouse.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    SqlWarehouse::connect_lazy(&url, Dialect::Sqlite)
        .unwrap()
        .with_batch_size(batch_size)
}

async fn count(warehouse: &SqlWarehouse, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) FROM \"{}\"", table))
        .fetch_one(warehouse.pool())
        .await
        .unwrap()
        .try_get::<i64, _>(0)
        .unwrap()
}

#[tokio::test]
async fn test_tables_are_created_and_filled() {
    let dir = TempDir::new().unwrap();
    // two rows per INSERT to exercise batching
    let warehouse = sqlite_warehouse(&dir, 2);
    let pipeline = Pipeline::new(
        seeded_store().await,
        StarSchemaTransformer::new(),
        warehouse.clone(),
    );

    let report = pipeline.run().await.unwrap();
    assert!(report.all_loaded(), "failed: {:?}", report.failed_tables());

    assert_eq!(count(&warehouse, "DimDate").await, 2);
    assert_eq!(count(&warehouse, "DimCustomer").await, 2);
    assert_eq!(count(&warehouse, "DimProduct").await, 3);
    assert_eq!(count(&warehouse, "FactSales").await, 3);

    let row = sqlx::query(
        "SELECT \"Category\", \"Brand\" FROM \"DimProduct\" WHERE product_key = 'X123'",
    )
    .fetch_one(warehouse.pool())
    .await
    .unwrap();
    assert_eq!(row.try_get::<String, _>(0).unwrap(), "Unknown");
    assert_eq!(row.try_get::<String, _>(1).unwrap(), "Unknown");

    let row = sqlx::query(
        "SELECT full_date, quarter FROM \"DimDate\" WHERE date_key = 20111209",
    )
    .fetch_one(warehouse.pool())
    .await
    .unwrap();
    assert_eq!(row.try_get::<String, _>(0).unwrap(), "2011-12-09");
    assert_eq!(row.try_get::<i64, _>(1).unwrap(), 4);

    let revenue: f64 = sqlx::query("SELECT SUM(\"Revenue\") FROM \"FactSales\"")
        .fetch_one(warehouse.pool())
        .await
        .unwrap()
        .try_get(0)
        .unwrap();
    assert!((revenue - (25.5 + 3.0 + 6.0)).abs() < 1e-9);
}

#[tokio::test]
async fn test_second_run_replaces_rows() {
    let dir = TempDir::new().unwrap();
    let warehouse = sqlite_warehouse(&dir, 1000);
    let pipeline = Pipeline::new(
        seeded_store().await,
        StarSchemaTransformer::new(),
        warehouse.clone(),
    );

    pipeline.run().await.unwrap();
    pipeline.run().await.unwrap();

    assert_eq!(count(&warehouse, "FactSales").await, 3);
    assert_eq!(count(&warehouse, "DimCustomer").await, 2);
}

#[tokio::test]
async fn test_configured_sqlite_loader() {
    let dir = TempDir::new().unwrap();
    let database = dir.path().join("configured.db");
    let database = database.display().to_string();
    let config = PipelineConfig::from_lookup(|key| match key {
        "STORAGE_CONNECTION_STRING" => Some("memory://".to_string()),
        "CONTAINER_NAME" => Some("raw".to_string()),
        "DB_DRIVER" => Some("sqlite".to_string()),
        "DB_DATABASE" => Some(database.clone()),
        _ => None,
    })
    .unwrap();

    let loader = config.loader().unwrap();
    let Warehouse::Sql(sql) = &loader else {
        panic!("expected a SQL warehouse");
    };
    let sql = sql.clone();

    let report = Pipeline::new(seeded_store().await, StarSchemaTransformer::new(), loader)
        .run()
        .await
        .unwrap();
    assert!(report.all_loaded());
    assert_eq!(count(&sql, "DimDate").await, 2);
}

#[tokio::test]
async fn test_unreachable_database_fails_every_table() {
    let dir = TempDir::new().unwrap();
    // read-only mode on a file that does not exist cannot connect
    let url = format!(
        "sqlite://{}?mode=ro",
        dir.path().join("missing.db").display()
    );
    let warehouse = SqlWarehouse::connect_lazy(&url, Dialect::Sqlite).unwrap();
    let pipeline = Pipeline::new(seeded_store().await, StarSchemaTransformer::new(), warehouse);

    let report = pipeline.run().await.unwrap();
    assert!(!report.all_loaded());
    assert_eq!(
        report.failed_tables(),
        vec!["DimDate", "DimCustomer", "DimProduct", "FactSales"]
    );
}
