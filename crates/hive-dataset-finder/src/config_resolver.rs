// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Per-dataset config resolution.
//!
//! Resolution runs two steps in order:
//!
//! 1. **Base config.** With a config store configured, the dataset's node in
//!    the store; otherwise the whole job configuration.
//! 2. **Scope.** With a non-blank prefix configured, only the keys under that
//!    prefix (prefix stripped); otherwise the base config unchanged.

use std::sync::Arc;

use snafu::{Location, ResultExt, Snafu};

use crate::config_store::{dataset_config_uri, ConfigStoreClient, ConfigStoreError};
use crate::dataset_config::DatasetConfig;
use crate::properties::{Properties, CONFIG_MANAGEMENT_STORE_URI_KEY, HIVE_DATASET_CONFIG_PREFIX_KEY};
use crate::DbAndTable;

#[derive(Debug, Snafu)]
pub enum ConfigResolutionError {
    #[snafu(display("Failed to fetch config for {dataset} from the config store: {source}"))]
    ConfigStore {
        dataset: String,
        source: ConfigStoreError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Where a dataset's base config comes from.
#[derive(Clone)]
pub enum BaseConfigSource {
    ConfigStore {
        store_uri: String,
        client: Arc<dyn ConfigStoreClient>,
    },
    JobConfig(DatasetConfig),
}

impl std::fmt::Debug for BaseConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigStore { store_uri, .. } => {
                f.debug_struct("ConfigStore").field("store_uri", store_uri).finish()
            }
            Self::JobConfig(config) => f.debug_tuple("JobConfig").field(&config.len()).finish(),
        }
    }
}

impl BaseConfigSource {
    pub async fn base_config(
        &self,
        db_and_table: &DbAndTable,
    ) -> Result<DatasetConfig, ConfigResolutionError> {
        match self {
            Self::ConfigStore { store_uri, client } => {
                let fetch = async {
                    let uri = dataset_config_uri(store_uri, db_and_table)?;
                    client.get_config(&uri).await
                };
                fetch.await.context(ConfigStoreSnafu {
                    dataset: db_and_table.to_string(),
                })
            }
            Self::JobConfig(config) => Ok(config.clone()),
        }
    }
}

/// Narrow `config` to the keys under `prefix`. A blank or missing prefix
/// leaves it unchanged.
pub fn scope_to_prefix(config: DatasetConfig, prefix: Option<&str>) -> DatasetConfig {
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => {
            if !config.has_path(prefix) {
                tracing::debug!(prefix, "dataset config has no keys under prefix");
            }
            config.sub_config(prefix)
        }
        None => config,
    }
}

/// Computes the effective config of a dataset.
#[derive(Debug, Clone)]
pub struct DatasetConfigResolver {
    source: BaseConfigSource,
    prefix: Option<String>,
}

impl DatasetConfigResolver {
    pub fn new(source: BaseConfigSource, prefix: Option<String>) -> Self {
        Self { source, prefix }
    }

    /// Use the config store at `gobblin.config.management.store.uri` when it
    /// is set, the job properties otherwise, and `hive.dataset.configPrefix`
    /// for scoping.
    pub fn from_properties(properties: &Properties, store_client: Arc<dyn ConfigStoreClient>) -> Self {
        let source = match properties.get(CONFIG_MANAGEMENT_STORE_URI_KEY) {
            Some(store_uri) => BaseConfigSource::ConfigStore {
                store_uri: store_uri.to_string(),
                client: store_client,
            },
            None => BaseConfigSource::JobConfig(properties.to_dataset_config()),
        };
        let prefix = properties
            .get(HIVE_DATASET_CONFIG_PREFIX_KEY)
            .map(str::to_string);
        Self::new(source, prefix)
    }

    pub fn source(&self) -> &BaseConfigSource {
        &self.source
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub async fn resolve(
        &self,
        db_and_table: &DbAndTable,
    ) -> Result<DatasetConfig, ConfigResolutionError> {
        let base = self.source.base_config(db_and_table).await?;
        Ok(scope_to_prefix(base, self.prefix()))
    }
}
