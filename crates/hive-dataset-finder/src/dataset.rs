// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! The dataset objects handed to downstream pipelines.

use std::fmt;
use std::sync::{Arc, LazyLock};

use arrow_schema::SchemaRef;
use snafu::{Location, ResultExt, Snafu};
use url::Url;

use crate::catalog_client::TableInfo;
use crate::client_pool::CatalogClientPool;
use crate::dataset_config::DatasetConfig;
use crate::properties::Properties;
use crate::type_mapping::table_to_arrow_schema;
use crate::DbAndTable;

#[derive(Debug, Snafu)]
pub enum DatasetError {
    #[snafu(display("Table {dataset} has an invalid storage location '{raw}': {source}"))]
    StorageLocation {
        dataset: String,
        raw: String,
        source: url::ParseError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Handle to the filesystem datasets live on. Passed through untouched.
pub trait FileSystem: Send + Sync + fmt::Debug {
    fn uri(&self) -> &Url;
}

static LOCAL_ROOT: LazyLock<Url> =
    LazyLock::new(|| Url::parse("file:///").expect("valid file URL"));

/// The local filesystem, rooted at `file:///`.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    uri: Url,
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self {
            uri: LOCAL_ROOT.clone(),
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn uri(&self) -> &Url {
        &self.uri
    }
}

/// A discovered Hive table, with the config resolved for it.
#[derive(Clone)]
pub struct HiveDataset {
    fs: Arc<dyn FileSystem>,
    client_pool: CatalogClientPool,
    table: TableInfo,
    schema: SchemaRef,
    location: Option<Url>,
    properties: Properties,
    dataset_config: DatasetConfig,
}

impl fmt::Debug for HiveDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HiveDataset")
            .field("urn", &self.urn())
            .field("location", &self.location.as_ref().map(Url::as_str))
            .field("dataset_config", &self.dataset_config)
            .finish()
    }
}

impl HiveDataset {
    /// Build a dataset from a catalog record.
    ///
    /// Fails when the storage location is not a URL. Relative locations
    /// resolve against the filesystem root.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        client_pool: CatalogClientPool,
        table: TableInfo,
        properties: Properties,
        dataset_config: DatasetConfig,
    ) -> Result<Self, DatasetError> {
        let dataset = format!("{}.{}", table.db_name, table.table_name);
        let schema = table_to_arrow_schema(&table.columns, &table.partition_keys);
        let location = table
            .storage_location
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .or_else(|_| fs.uri().join(raw))
                    .context(StorageLocationSnafu {
                        dataset: dataset.as_str(),
                        raw,
                    })
            })
            .transpose()?;

        Ok(Self {
            fs,
            client_pool,
            table,
            schema,
            location,
            properties,
            dataset_config,
        })
    }

    pub fn db_and_table(&self) -> DbAndTable {
        DbAndTable::new(&self.table.db_name, &self.table.table_name)
    }

    /// `<db>.<table>`, used as the dataset URN in events.
    pub fn urn(&self) -> String {
        self.db_and_table().to_string()
    }

    pub fn table(&self) -> &TableInfo {
        &self.table
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn client_pool(&self) -> &CatalogClientPool {
        &self.client_pool
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn dataset_config(&self) -> &DatasetConfig {
        &self.dataset_config
    }
}

/// Everything a [`DatasetFactory`] needs to build one dataset.
pub struct DatasetParts<'a> {
    pub fs: &'a Arc<dyn FileSystem>,
    pub client_pool: &'a CatalogClientPool,
    pub properties: &'a Properties,
    pub table: TableInfo,
    pub dataset_config: DatasetConfig,
}

/// Builds datasets from catalog records. Replace it to decorate or veto
/// datasets without touching discovery.
pub trait DatasetFactory: Send + Sync {
    fn create_dataset(&self, parts: DatasetParts<'_>) -> Result<HiveDataset, DatasetError>;
}

/// Calls [`HiveDataset::new`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HiveDatasetFactory;

impl DatasetFactory for HiveDatasetFactory {
    fn create_dataset(&self, parts: DatasetParts<'_>) -> Result<HiveDataset, DatasetError> {
        HiveDataset::new(
            parts.fs.clone(),
            parts.client_pool.clone(),
            parts.table,
            parts.properties.clone(),
            parts.dataset_config,
        )
    }
}
