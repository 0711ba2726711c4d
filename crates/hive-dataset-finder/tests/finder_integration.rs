// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! End-to-end discovery tests over an in-memory catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use url::Url;

use hive_dataset_finder::config_store::ConfigStoreResult;
use hive_dataset_finder::events::{
    DATASET_ERROR, DATASET_FOUND, DATASET_URN_KEY, FAILURE_CONTEXT_KEY,
};
use hive_dataset_finder::{
    CatalogClient, CatalogClientPool, CatalogError, CatalogResult, ColumnInfo, ConfigStoreClient,
    ConfigStoreError, DatasetConfig, DbAndTable, EventSubmitter, FinderError, HiveDatasetFinder,
    InMemoryCatalog, LocalFileSystem, Properties, TableInfo,
};

#[derive(Debug, Clone, PartialEq)]
struct RecordedEvent {
    name: String,
    metadata: HashMap<String, String>,
}

#[derive(Default)]
struct RecordingSubmitter {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSubmitter {
    fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    fn named(&self, name: &str) -> Vec<RecordedEvent> {
        self.events().into_iter().filter(|e| e.name == name).collect()
    }
}

impl EventSubmitter for RecordingSubmitter {
    fn submit(&self, name: &str, metadata: &[(&str, &str)]) {
        self.events.lock().push(RecordedEvent {
            name: name.to_string(),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}

/// Serves fixed configs keyed by URI path and records every lookup.
#[derive(Default)]
struct MapConfigStore {
    configs: HashMap<String, DatasetConfig>,
    requested: Mutex<Vec<String>>,
}

impl MapConfigStore {
    fn with_config(mut self, path: &str, config: DatasetConfig) -> Self {
        self.configs.insert(path.to_string(), config);
        self
    }
}

#[async_trait]
impl ConfigStoreClient for MapConfigStore {
    async fn get_config(&self, uri: &Url) -> ConfigStoreResult<DatasetConfig> {
        self.requested.lock().push(uri.to_string());
        self.configs
            .get(uri.path())
            .cloned()
            .ok_or_else(|| ConfigStoreError::NotFound(uri.to_string()))
    }
}

/// A catalog whose database listing always fails.
struct UnreachableCatalog;

#[async_trait]
impl CatalogClient for UnreachableCatalog {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn list_databases(&self) -> CatalogResult<Vec<String>> {
        Err(CatalogError::ConnectionError("metastore is down".to_string()))
    }

    async fn list_tables(&self, _database: &str) -> CatalogResult<Vec<String>> {
        Err(CatalogError::ConnectionError("metastore is down".to_string()))
    }

    async fn get_table(&self, _database: &str, _table: &str) -> CatalogResult<TableInfo> {
        Err(CatalogError::ConnectionError("metastore is down".to_string()))
    }
}

fn table(db: &str, name: &str) -> TableInfo {
    TableInfo::new(db, name)
        .with_columns(vec![
            ColumnInfo::new("id", "bigint", 0),
            ColumnInfo::new("name", "string", 1),
        ])
        .with_location(format!("hdfs://nn:8020/warehouse/{}.db/{}", db, name))
}

fn sample_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_table(table("db1", "t1"))
        .with_table(table("db1", "t2"))
        .with_table(table("db2", "t1"))
        .with_table(table("dbSecret", "t1"))
}

fn finder_over(catalog: impl CatalogClient + 'static, properties: Properties) -> HiveDatasetFinder {
    HiveDatasetFinder::with_client_pool(
        Arc::new(LocalFileSystem::default()),
        properties,
        CatalogClientPool::single(Arc::new(catalog)),
    )
    .unwrap()
}

fn urns(finder_output: &[hive_dataset_finder::HiveDataset]) -> Vec<String> {
    finder_output.iter().map(|d| d.urn()).collect()
}

// ---- listing ----

#[tokio::test]
async fn test_whitelist_excludes_other_databases() {
    let finder = finder_over(
        sample_catalog(),
        Properties::new().with("hive.dataset.whitelist", "db1.*,db2.*"),
    );

    let tables = finder.get_tables().await.unwrap();
    assert_eq!(
        tables,
        vec![
            DbAndTable::new("db1", "t1"),
            DbAndTable::new("db1", "t2"),
            DbAndTable::new("db2", "t1"),
        ]
    );
}

#[tokio::test]
async fn test_fixed_database_with_table_pattern() {
    let catalog = InMemoryCatalog::new()
        .with_table(table("sales", "orders_2020"))
        .with_table(table("sales", "customers"))
        .with_table(table("sales", "orders_2021"))
        .with_table(table("audit", "orders_2020"));
    let finder = finder_over(
        catalog,
        Properties::new()
            .with("hive.dataset.database", "sales")
            .with("hive.dataset.table.pattern", "orders_*"),
    );

    let tables = finder.get_tables().await.unwrap();
    assert_eq!(
        tables,
        vec![
            DbAndTable::new("sales", "orders_2020"),
            DbAndTable::new("sales", "orders_2021"),
        ]
    );
}

#[tokio::test]
async fn test_blacklist_removes_tables() {
    let finder = finder_over(
        sample_catalog(),
        Properties::new()
            .with("hive.dataset.whitelist", "*")
            .with("hive.dataset.blacklist", "dbSecret,db1.t2"),
    );

    let tables = finder.get_tables().await.unwrap();
    assert_eq!(
        tables,
        vec![DbAndTable::new("db1", "t1"), DbAndTable::new("db2", "t1")]
    );
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let finder = finder_over(
        UnreachableCatalog,
        Properties::new().with("hive.dataset.whitelist", "*"),
    );

    let err = finder.get_tables().await.unwrap_err();
    assert!(matches!(err, FinderError::CatalogListing { .. }));
    assert!(err.to_string().contains("metastore is down"));

    let err = finder.find_datasets().await.unwrap_err();
    assert!(matches!(err, FinderError::CatalogListing { .. }));
    assert_eq!(finder.client_pool().leased_count(), 0);
}

// ---- dataset resolution ----

#[tokio::test]
async fn test_find_datasets_in_catalog_order() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(
        sample_catalog(),
        Properties::new().with("hive.dataset.whitelist", "db1,db2"),
    )
    .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(urns(&datasets), ["db1.t1", "db1.t2", "db2.t1"]);

    let found = submitter.named(DATASET_FOUND);
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].metadata[DATASET_URN_KEY], "db1.t1");
    assert!(submitter.named(DATASET_ERROR).is_empty());

    let first = &datasets[0];
    assert_eq!(first.schema().fields().len(), 2);
    assert_eq!(
        first.location().map(Url::as_str),
        Some("hdfs://nn:8020/warehouse/db1.db/t1")
    );
    assert_eq!(finder.client_pool().leased_count(), 0);
}

#[tokio::test]
async fn test_failed_table_is_reported_and_skipped() {
    let broken = table("db1", "t2").with_location("http://[::1/warehouse/t2");
    let catalog = InMemoryCatalog::new()
        .with_table(table("db1", "t1"))
        .with_table(broken)
        .with_table(table("db1", "t3"));
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(catalog, Properties::new().with("hive.dataset.database", "db1"))
        .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(urns(&datasets), ["db1.t1", "db1.t3"]);

    let errors = submitter.named(DATASET_ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].metadata[DATASET_URN_KEY], "db1.t2");
    assert!(errors[0].metadata[FAILURE_CONTEXT_KEY].contains("invalid storage location"));

    // No DatasetFound for the broken table.
    let found: Vec<_> = submitter
        .named(DATASET_FOUND)
        .into_iter()
        .map(|e| e.metadata[DATASET_URN_KEY].clone())
        .collect();
    assert_eq!(found, ["db1.t1", "db1.t3"]);
    assert_eq!(finder.client_pool().leased_count(), 0);
}

#[tokio::test]
async fn test_tables_with_uncommon_column_types_are_yielded() {
    use arrow_schema::{DataType, IntervalUnit, TimeUnit};

    let catalog = InMemoryCatalog::new()
        .with_table(
            TableInfo::new("db1", "events")
                .with_columns(vec![ColumnInfo::new("ts", "timestamp with local time zone", 0)]),
        )
        .with_table(
            TableInfo::new("db1", "spans")
                .with_columns(vec![ColumnInfo::new("span", "interval_day_time", 0)]),
        )
        .with_table(
            TableInfo::new("db1", "shapes")
                .with_columns(vec![ColumnInfo::new("shape", "geometry", 0)]),
        );
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(catalog, Properties::new().with("hive.dataset.database", "db1"))
        .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(urns(&datasets), ["db1.events", "db1.spans", "db1.shapes"]);
    assert!(submitter.named(DATASET_ERROR).is_empty());

    assert_eq!(
        *datasets[0].schema().field(0).data_type(),
        DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()))
    );
    assert_eq!(
        *datasets[1].schema().field(0).data_type(),
        DataType::Interval(IntervalUnit::DayTime)
    );
    assert_eq!(*datasets[2].schema().field(0).data_type(), DataType::Utf8);
}

#[tokio::test]
async fn test_blacklisted_by_config_yields_nothing() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(
        sample_catalog(),
        Properties::new()
            .with("hive.dataset.database", "db1")
            .with("is.blacklisted", "true"),
    )
    .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert!(datasets.is_empty());
    assert!(submitter.events().is_empty());
}

#[tokio::test]
async fn test_unparsable_blacklist_flag_is_a_dataset_error() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(
        sample_catalog(),
        Properties::new()
            .with("hive.dataset.database", "db2")
            .with("is.blacklisted", "maybe"),
    )
    .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert!(datasets.is_empty());
    let errors = submitter.named(DATASET_ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].metadata[FAILURE_CONTEXT_KEY].contains("maybe"));
}

#[tokio::test]
async fn test_missing_table_is_a_dataset_error() {
    // Listed but gone by the time it is fetched.
    struct VanishingCatalog(InMemoryCatalog);

    #[async_trait]
    impl CatalogClient for VanishingCatalog {
        fn name(&self) -> &str {
            "vanishing"
        }

        async fn list_databases(&self) -> CatalogResult<Vec<String>> {
            self.0.list_databases().await
        }

        async fn list_tables(&self, database: &str) -> CatalogResult<Vec<String>> {
            let mut tables = self.0.list_tables(database).await?;
            tables.push("dropped".to_string());
            Ok(tables)
        }

        async fn get_table(&self, database: &str, table: &str) -> CatalogResult<TableInfo> {
            self.0.get_table(database, table).await
        }
    }

    let submitter = Arc::new(RecordingSubmitter::default());
    let catalog = VanishingCatalog(InMemoryCatalog::new().with_table(table("db1", "t1")));
    let finder = finder_over(catalog, Properties::new().with("hive.dataset.database", "db1"))
        .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(urns(&datasets), ["db1.t1"]);
    let errors = submitter.named(DATASET_ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].metadata[DATASET_URN_KEY], "db1.dropped");
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(
        sample_catalog(),
        Properties::new().with("hive.dataset.database", "db1"),
    )
    .with_event_submitter(submitter.clone());

    let mut datasets = std::pin::pin!(finder.datasets_stream().await.unwrap());
    assert!(submitter.events().is_empty());

    let first = datasets.next().await.unwrap();
    assert_eq!(first.urn(), "db1.t1");
    assert_eq!(submitter.events().len(), 1);

    let second = datasets.next().await.unwrap();
    assert_eq!(second.urn(), "db1.t2");
    assert!(datasets.next().await.is_none());
}

#[tokio::test]
async fn test_repeated_passes_are_independent() {
    let finder = finder_over(
        sample_catalog(),
        Properties::new().with("hive.dataset.whitelist", "db1.*,db2.*"),
    );

    let first = urns(&finder.find_datasets().await.unwrap());
    let second = urns(&finder.find_datasets().await.unwrap());
    assert_eq!(first, second);
    assert_eq!(first, ["db1.t1", "db1.t2", "db2.t1"]);
}

// ---- config resolution ----

#[tokio::test]
async fn test_job_config_scoped_to_prefix() {
    let finder = finder_over(
        sample_catalog(),
        Properties::new()
            .with("hive.dataset.database", "db2")
            .with("hive.dataset.configPrefix", "hive.conf")
            .with("hive.conf.retention", "7d")
            .with("hive.conf.owner", "etl")
            .with("unrelated", "x"),
    );

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(datasets.len(), 1);
    let config = datasets[0].dataset_config();
    assert_eq!(config.get("retention"), Some("7d"));
    assert_eq!(config.get("owner"), Some("etl"));
    assert_eq!(config.get("unrelated"), None);
    assert_eq!(config.len(), 2);
}

#[tokio::test]
async fn test_config_store_wins_over_job_config() {
    let store = Arc::new(
        MapConfigStore::default()
            .with_config(
                "/configs/hive/db1/t1",
                DatasetConfig::from_iter([("retention", "30d")]),
            )
            .with_config(
                "/configs/hive/db1/t2",
                DatasetConfig::from_iter([("is.blacklisted", "true")]),
            ),
    );
    let finder = finder_over(
        sample_catalog(),
        Properties::new()
            .with("hive.dataset.database", "db1")
            .with("gobblin.config.management.store.uri", "http://store:8080/configs")
            .with("retention", "1d"),
    )
    .with_config_store_client(store.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(urns(&datasets), ["db1.t1"]);
    assert_eq!(datasets[0].dataset_config().get("retention"), Some("30d"));
    // Job properties still travel with the dataset.
    assert_eq!(datasets[0].properties().get("retention"), Some("1d"));

    assert_eq!(
        *store.requested.lock(),
        [
            "http://store:8080/configs/hive/db1/t1",
            "http://store:8080/configs/hive/db1/t2",
        ]
    );
}

#[tokio::test]
async fn test_config_store_failure_is_a_dataset_error() {
    let store = Arc::new(MapConfigStore::default().with_config(
        "/hive/db1/t2",
        DatasetConfig::from_iter([("owner", "etl")]),
    ));
    let submitter = Arc::new(RecordingSubmitter::default());
    let finder = finder_over(
        sample_catalog(),
        Properties::new()
            .with("hive.dataset.database", "db1")
            .with("gobblin.config.management.store.uri", "http://store:8080"),
    )
    .with_config_store_client(store)
    .with_event_submitter(submitter.clone());

    let datasets = finder.find_datasets().await.unwrap();
    assert_eq!(urns(&datasets), ["db1.t2"]);

    let errors = submitter.named(DATASET_ERROR);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].metadata[DATASET_URN_KEY], "db1.t1");
    assert!(errors[0].metadata[FAILURE_CONTEXT_KEY].contains("Config not found"));
    assert_eq!(finder.client_pool().leased_count(), 0);
}
