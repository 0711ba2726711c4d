// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Discovery of Hive datasets from a metadata catalog.
//!
//! This crate finds the tables of a Hive-style catalog that a job is allowed
//! to touch and turns each into a [`HiveDataset`] with its own resolved
//! configuration:
//!
//! - [`WhitelistBlacklist`]: decides which databases and tables are in scope
//! - [`DatasetConfigResolver`]: resolves a dataset's config from a config
//!   store or the job properties, optionally scoped to a key prefix
//! - [`HiveDatasetFinder`]: lists accepted tables and lazily builds datasets,
//!   skipping (and reporting) tables that fail to resolve
//!
//! The catalog itself is reached through the [`CatalogClient`] trait, leased
//! from a [`CatalogClientPool`].

pub mod catalog_client;
pub mod client_pool;
pub mod config_resolver;
pub mod config_store;
pub mod dataset;
pub mod dataset_config;
pub mod error;
pub mod events;
pub mod finder;
pub mod in_memory;
pub mod properties;
pub mod rest_catalog;
pub mod type_mapping;
pub mod whitelist_blacklist;

// Catalog client exports
pub use catalog_client::{
    CatalogClient, CatalogError, CatalogResult, ColumnInfo, DataSourceFormat, TableInfo,
    TableType,
};
pub use client_pool::{CatalogClientFactory, CatalogClientPool, PooledClient};
pub use in_memory::InMemoryCatalog;
pub use rest_catalog::{RestCatalogClient, RestCatalogConfig};

// Config exports
pub use config_resolver::{BaseConfigSource, ConfigResolutionError, DatasetConfigResolver};
pub use config_store::{
    ConfigClient, ConfigStoreClient, ConfigStoreError, HttpConfigStoreClient,
    HttpConfigStoreConfig,
};
pub use dataset_config::DatasetConfig;
pub use properties::Properties;

// Discovery exports
pub use dataset::{
    DatasetError, DatasetFactory, DatasetParts, FileSystem, HiveDataset, HiveDatasetFactory,
    LocalFileSystem,
};
pub use error::{DatasetResolutionError, FinderError, Result};
pub use events::{EventSubmitter, NoopEventSubmitter, TracingEventSubmitter};
pub use finder::{DbAndTable, HiveDatasetFinder};
pub use whitelist_blacklist::{PatternError, WhitelistBlacklist};
