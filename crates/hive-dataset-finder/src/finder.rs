// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Discovery of Hive datasets.
//!
//! [`HiveDatasetFinder`] lists the tables of a catalog that pass a
//! [`WhitelistBlacklist`], then turns each of them into a [`HiveDataset`]
//! carrying its resolved config.
//!
//! Listing is all-or-nothing: if the catalog cannot be listed, the pass fails.
//! Resolution is per table: a table whose config, metadata or dataset cannot
//! be built is logged, reported as a `DatasetError` event and skipped, so one
//! broken table never hides the rest of a database.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use futures::StreamExt;
//! # use hive_dataset_finder::{HiveDatasetFinder, LocalFileSystem, Properties};
//! # async fn example() -> hive_dataset_finder::Result<()> {
//! let properties = Properties::new()
//!     .with("hive.dataset.database", "sales")
//!     .with("hive.dataset.table.pattern", "orders_*");
//! let finder = HiveDatasetFinder::new(Arc::new(LocalFileSystem::default()), properties)?;
//!
//! let mut datasets = std::pin::pin!(finder.datasets_stream().await?);
//! while let Some(dataset) = datasets.next().await {
//!     println!("{}", dataset.urn());
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use snafu::ResultExt;

use crate::client_pool::CatalogClientPool;
use crate::config_resolver::DatasetConfigResolver;
use crate::config_store::{ConfigClient, ConfigStoreClient};
use crate::dataset::{DatasetFactory, DatasetParts, FileSystem, HiveDataset, HiveDatasetFactory};
use crate::error::*;
use crate::events::{
    EventSubmitter, NoopEventSubmitter, DATASET_ERROR, DATASET_FOUND, DATASET_URN_KEY,
    FAILURE_CONTEXT_KEY,
};
use crate::properties::{
    Properties, DB_KEY, DEFAULT_TABLE_PATTERN, HIVE_DATASET_IS_BLACKLISTED_KEY,
    TABLE_PATTERN_KEY, WHITELIST_KEY,
};
use crate::whitelist_blacklist::WhitelistBlacklist;

/// A database and one of its tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbAndTable {
    db: String,
    table: String,
}

impl DbAndTable {
    pub fn new(db: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            table: table.into(),
        }
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for DbAndTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.table)
    }
}

/// Finds [`HiveDataset`]s in a catalog.
pub struct HiveDatasetFinder {
    properties: Properties,
    client_pool: CatalogClientPool,
    fs: Arc<dyn FileSystem>,
    whitelist_blacklist: WhitelistBlacklist,
    event_submitter: Arc<dyn EventSubmitter>,
    config_resolver: DatasetConfigResolver,
    dataset_factory: Arc<dyn DatasetFactory>,
}

impl HiveDatasetFinder {
    /// Create a finder backed by a REST catalog at
    /// `hive.dataset.hive.metastore.uri`.
    pub fn new(fs: Arc<dyn FileSystem>, properties: Properties) -> Result<Self> {
        let client_pool = CatalogClientPool::from_properties(&properties).context(CatalogPoolSnafu)?;
        Self::with_client_pool(fs, properties, client_pool)
    }

    /// Create a finder over an existing client pool.
    ///
    /// Fails when neither `hive.dataset.database` nor `hive.dataset.whitelist`
    /// is set. When both are, the fixed database wins.
    pub fn with_client_pool(
        fs: Arc<dyn FileSystem>,
        properties: Properties,
        client_pool: CatalogClientPool,
    ) -> Result<Self> {
        let whitelist_blacklist = selection_from_properties(&properties)?;
        let store_client: Arc<dyn ConfigStoreClient> =
            Arc::new(ConfigClient::with_http().context(ConfigStoreClientSnafu)?);
        let config_resolver = DatasetConfigResolver::from_properties(&properties, store_client);

        Ok(Self {
            properties,
            client_pool,
            fs,
            whitelist_blacklist,
            event_submitter: Arc::new(NoopEventSubmitter),
            config_resolver,
            dataset_factory: Arc::new(HiveDatasetFactory),
        })
    }

    pub fn with_event_submitter(mut self, event_submitter: Arc<dyn EventSubmitter>) -> Self {
        self.event_submitter = event_submitter;
        self
    }

    /// Serve config store lookups with `client` instead of the HTTP client.
    pub fn with_config_store_client(mut self, client: Arc<dyn ConfigStoreClient>) -> Self {
        self.config_resolver = DatasetConfigResolver::from_properties(&self.properties, client);
        self
    }

    pub fn with_dataset_factory(mut self, dataset_factory: Arc<dyn DatasetFactory>) -> Self {
        self.dataset_factory = dataset_factory;
        self
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn client_pool(&self) -> &CatalogClientPool {
        &self.client_pool
    }

    pub fn whitelist_blacklist(&self) -> &WhitelistBlacklist {
        &self.whitelist_blacklist
    }

    pub fn config_resolver(&self) -> &DatasetConfigResolver {
        &self.config_resolver
    }

    /// Root shared by every dataset this finder produces.
    pub fn common_dataset_root(&self) -> &Path {
        Path::new("/")
    }

    /// All accepted tables, in catalog order.
    pub async fn get_tables(&self) -> Result<Vec<DbAndTable>> {
        let client = self.client_pool.get_client().context(CatalogListingSnafu)?;
        let mut tables = Vec::new();

        let databases = client.list_databases().await.context(CatalogListingSnafu)?;
        for db in databases
            .into_iter()
            .filter(|db| self.whitelist_blacklist.accept_db(db))
        {
            let names = client.list_tables(&db).await.context(CatalogListingSnafu)?;
            tables.extend(
                names
                    .into_iter()
                    .filter(|table| self.whitelist_blacklist.accept_table(&db, table))
                    .map(|table| DbAndTable::new(db.as_str(), table)),
            );
        }

        tracing::debug!(
            count = tables.len(),
            catalog = client.name(),
            "listed accepted tables"
        );
        Ok(tables)
    }

    /// Every dataset, collected eagerly. Tables that fail to resolve are
    /// skipped.
    pub async fn find_datasets(&self) -> Result<Vec<HiveDataset>> {
        Ok(self.datasets_stream().await?.collect().await)
    }

    /// Stream the datasets of all accepted tables.
    ///
    /// The table listing happens up front; each dataset is then resolved only
    /// when the stream is polled for it. The stream cannot be restarted; call
    /// this again for a fresh pass.
    pub async fn datasets_stream(&self) -> Result<impl Stream<Item = HiveDataset> + '_> {
        let tables = self.get_tables().await?;

        Ok(stream! {
            for db_and_table in tables {
                let urn = db_and_table.to_string();
                match self.resolve_dataset(&db_and_table).await {
                    Ok(Some(dataset)) => {
                        self.event_submitter
                            .submit(DATASET_FOUND, &[(DATASET_URN_KEY, urn.as_str())]);
                        yield dataset;
                    }
                    Ok(None) => {
                        tracing::debug!(dataset = %db_and_table, "dataset is blacklisted, skipping");
                    }
                    Err(err) => {
                        tracing::error!(
                            dataset = %db_and_table,
                            error = %err,
                            "Failed to create HiveDataset for table"
                        );
                        let failure = err.to_string();
                        self.event_submitter.submit(
                            DATASET_ERROR,
                            &[
                                (DATASET_URN_KEY, urn.as_str()),
                                (FAILURE_CONTEXT_KEY, failure.as_str()),
                            ],
                        );
                    }
                }
            }
        })
    }

    /// Build the dataset for one table, or `None` if its config blacklists it.
    async fn resolve_dataset(
        &self,
        db_and_table: &DbAndTable,
    ) -> std::result::Result<Option<HiveDataset>, DatasetResolutionError> {
        let client = self.client_pool.get_client().context(CatalogRequestSnafu)?;

        let dataset_config = self
            .config_resolver
            .resolve(db_and_table)
            .await
            .context(ConfigResolutionSnafu)?;
        if dataset_config
            .get_bool(HIVE_DATASET_IS_BLACKLISTED_KEY, false)
            .context(BlacklistFlagSnafu)?
        {
            return Ok(None);
        }

        let table = client
            .get_table(db_and_table.db(), db_and_table.table())
            .await
            .context(CatalogRequestSnafu)?;

        let dataset = self
            .dataset_factory
            .create_dataset(DatasetParts {
                fs: &self.fs,
                client_pool: &self.client_pool,
                properties: &self.properties,
                table,
                dataset_config,
            })
            .context(ConstructionSnafu)?;
        Ok(Some(dataset))
    }
}

fn selection_from_properties(properties: &Properties) -> Result<WhitelistBlacklist> {
    let selection = match properties.get(DB_KEY) {
        Some(db) => WhitelistBlacklist::for_database(
            db,
            properties.get_or(TABLE_PATTERN_KEY, DEFAULT_TABLE_PATTERN),
        ),
        None if properties.contains_key(WHITELIST_KEY) => {
            WhitelistBlacklist::from_properties(properties)
        }
        None => {
            return MissingDatasetSelectionSnafu {
                db_key: DB_KEY,
                whitelist_key: WHITELIST_KEY,
            }
            .fail()
        }
    };
    selection.context(InvalidPatternSnafu)
}
