// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Config store clients.
//!
//! A config store is a path-addressed service: every dataset owns a node
//! (`<storeUri>/hive/<db>/<table>`) whose document is the dataset's config.
//! [`ConfigClient`] dispatches a URI to the store registered for its scheme;
//! out of the box `http` and `https` are served by [`HttpConfigStoreClient`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::dataset_config::DatasetConfig;
use crate::DbAndTable;

/// Path segment under which Hive dataset nodes live in a config store.
pub const HIVE_DATASETS_CONFIG_PREFIX: &str = "hive";

/// Errors raised while looking up a dataset config.
#[derive(Debug)]
pub enum ConfigStoreError {
    /// No store is registered for the URI's scheme.
    FactoryNotFound(String),
    /// The store client could not be created.
    Creation(String),
    /// The store URI could not be parsed.
    InvalidUri(String),
    /// The store has no node at this URI.
    NotFound(String),
    /// Network or HTTP error.
    Connection(String),
    /// Invalid or unparsable response from the store.
    InvalidResponse(String),
}

impl std::fmt::Display for ConfigStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FactoryNotFound(msg) => write!(f, "Config store factory does not exist: {}", msg),
            Self::Creation(msg) => write!(f, "Config store creation failed: {}", msg),
            Self::InvalidUri(msg) => write!(f, "Invalid config store URI: {}", msg),
            Self::NotFound(msg) => write!(f, "Config not found: {}", msg),
            Self::Connection(msg) => write!(f, "Config store connection error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid config store response: {}", msg),
        }
    }
}

impl std::error::Error for ConfigStoreError {}

pub type ConfigStoreResult<T> = std::result::Result<T, ConfigStoreError>;

/// Reads the config stored at a URI.
#[async_trait]
pub trait ConfigStoreClient: Send + Sync {
    async fn get_config(&self, uri: &Url) -> ConfigStoreResult<DatasetConfig>;
}

/// URI of the config node for `db_and_table` under `store_uri`.
pub fn dataset_config_uri(store_uri: &str, db_and_table: &DbAndTable) -> ConfigStoreResult<Url> {
    let raw = format!(
        "{}/{}/{}/{}",
        store_uri.trim_end_matches('/'),
        HIVE_DATASETS_CONFIG_PREFIX,
        db_and_table.db(),
        db_and_table.table()
    );
    Url::parse(&raw).map_err(|e| ConfigStoreError::InvalidUri(format!("'{}': {}", raw, e)))
}

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpConfigStoreClient`].
#[derive(Debug, Clone, Default)]
pub struct HttpConfigStoreConfig {
    /// Optional bearer token for authenticated access.
    pub bearer_token: Option<String>,
    /// Optional request timeout in seconds (default: 30).
    pub timeout_secs: Option<u64>,
}

/// Fetches config documents with `GET <uri>`; the body is a JSON object whose
/// nested objects are flattened into dotted keys.
pub struct HttpConfigStoreClient {
    config: HttpConfigStoreConfig,
    client: Client,
}

impl HttpConfigStoreClient {
    pub fn new(config: HttpConfigStoreConfig) -> ConfigStoreResult<Self> {
        let client = Client::builder()
            .timeout(Self::timeout(&config))
            .build()
            .map_err(|e| ConfigStoreError::Creation(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn timeout(config: &HttpConfigStoreConfig) -> std::time::Duration {
        std::time::Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Per-request timeout applied by this client.
    pub fn request_timeout(&self) -> std::time::Duration {
        Self::timeout(&self.config)
    }
}

#[async_trait]
impl ConfigStoreClient for HttpConfigStoreClient {
    async fn get_config(&self, uri: &Url) -> ConfigStoreResult<DatasetConfig> {
        let mut req = self.client.get(uri.clone());
        if let Some(ref token) = self.config.bearer_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ConfigStoreError::Connection(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ConfigStoreError::NotFound(uri.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConfigStoreError::Connection(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ConfigStoreError::InvalidResponse(e.to_string()))?;
        if !body.is_object() {
            return Err(ConfigStoreError::InvalidResponse(format!(
                "expected a JSON object at {}",
                uri
            )));
        }
        Ok(DatasetConfig::from_json(&body))
    }
}

/// Routes a config URI to the store registered for its scheme.
#[derive(Clone, Default)]
pub struct ConfigClient {
    stores: HashMap<String, Arc<dyn ConfigStoreClient>>,
}

impl ConfigClient {
    /// A client with no stores registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A client serving `http` and `https` URIs with [`HttpConfigStoreClient`].
    pub fn with_http() -> ConfigStoreResult<Self> {
        let http: Arc<dyn ConfigStoreClient> =
            Arc::new(HttpConfigStoreClient::new(HttpConfigStoreConfig::default())?);
        Ok(Self::empty()
            .with_store("http", http.clone())
            .with_store("https", http))
    }

    pub fn with_store(mut self, scheme: impl Into<String>, store: Arc<dyn ConfigStoreClient>) -> Self {
        self.stores.insert(scheme.into().to_lowercase(), store);
        self
    }
}

#[async_trait]
impl ConfigStoreClient for ConfigClient {
    async fn get_config(&self, uri: &Url) -> ConfigStoreResult<DatasetConfig> {
        let store = self.stores.get(uri.scheme()).ok_or_else(|| {
            ConfigStoreError::FactoryNotFound(format!("no store for scheme '{}'", uri.scheme()))
        })?;
        store.get_config(uri).await
    }
}
