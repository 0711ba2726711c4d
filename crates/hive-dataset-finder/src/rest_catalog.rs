// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! REST metastore client implementing the [`CatalogClient`] trait.
//!
//! Talks to a metastore exposing databases and tables over HTTP:
//!
//! - `GET /databases`
//! - `GET /databases/{db}/tables`
//! - `GET /databases/{db}/tables/{table}`

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::catalog_client::*;

/// Configuration for connecting to a REST metastore.
#[derive(Debug, Clone)]
pub struct RestCatalogConfig {
    /// Base URL of the metastore (e.g., `http://localhost:9083/api/v1`).
    pub base_url: String,
    /// Optional bearer token for authenticated access.
    pub bearer_token: Option<String>,
    /// Optional request timeout in seconds (default: 30).
    pub timeout_secs: Option<u64>,
}

impl RestCatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout_secs: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// REST metastore client.
pub struct RestCatalogClient {
    config: RestCatalogConfig,
    client: Client,
}

impl RestCatalogClient {
    pub fn new(config: RestCatalogConfig) -> CatalogResult<Self> {
        let timeout = config.timeout_secs.unwrap_or(30);
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout))
            .build()
            .map_err(|e| CatalogError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let mut req = self.client.get(&url);
        if let Some(ref token) = self.config.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        resource_name: &str,
    ) -> CatalogResult<T> {
        let resp = self
            .request(path)
            .send()
            .await
            .map_err(|e| CatalogError::ConnectionError(e.to_string()))?;

        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(format!("{} not found", resource_name)));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::AuthError(format!("HTTP {}: {}", status, body)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::ConnectionError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }
}

// ---- Serde models for the REST JSON responses ----

#[derive(Deserialize)]
struct ListDatabasesResponse {
    #[serde(default)]
    databases: Vec<NamedEntry>,
}

#[derive(Deserialize)]
struct ListTablesResponse {
    #[serde(default)]
    tables: Vec<NamedEntry>,
}

#[derive(Deserialize)]
struct NamedEntry {
    name: String,
}

#[derive(Deserialize)]
struct RestTable {
    db_name: String,
    table_name: String,
    owner: Option<String>,
    table_type: Option<String>,
    data_source_format: Option<String>,
    #[serde(default)]
    columns: Vec<RestColumn>,
    #[serde(default)]
    partition_keys: Vec<RestColumn>,
    location: Option<String>,
    #[serde(default)]
    parameters: HashMap<String, String>,
    create_time: Option<i64>,
}

#[derive(Deserialize)]
struct RestColumn {
    name: String,
    #[serde(rename = "type")]
    type_text: String,
    comment: Option<String>,
}

// ---- Conversion helpers ----

impl From<RestTable> for TableInfo {
    fn from(rest: RestTable) -> Self {
        let to_columns = |cols: Vec<RestColumn>| -> Vec<ColumnInfo> {
            cols.into_iter()
                .enumerate()
                .map(|(position, c)| ColumnInfo {
                    name: c.name,
                    type_text: c.type_text,
                    position: position as i32,
                    nullable: true,
                    comment: c.comment,
                })
                .collect()
        };

        TableInfo {
            db_name: rest.db_name,
            table_name: rest.table_name,
            owner: rest.owner,
            table_type: rest
                .table_type
                .as_deref()
                .map(TableType::parse)
                .unwrap_or(TableType::Managed),
            data_source_format: DataSourceFormat::parse(rest.data_source_format.as_deref()),
            columns: to_columns(rest.columns),
            partition_keys: to_columns(rest.partition_keys),
            storage_location: rest.location,
            parameters: rest.parameters,
            create_time: rest.create_time,
        }
    }
}

// ---- CatalogClient implementation ----

#[async_trait]
impl CatalogClient for RestCatalogClient {
    fn name(&self) -> &str {
        "rest-catalog"
    }

    async fn list_databases(&self) -> CatalogResult<Vec<String>> {
        let body: ListDatabasesResponse = self.fetch("/databases", "databases").await?;
        Ok(body.databases.into_iter().map(|d| d.name).collect())
    }

    async fn list_tables(&self, database: &str) -> CatalogResult<Vec<String>> {
        let body: ListTablesResponse = self
            .fetch(
                &format!("/databases/{}/tables", database),
                &format!("database '{}'", database),
            )
            .await?;
        Ok(body.tables.into_iter().map(|t| t.name).collect())
    }

    async fn get_table(&self, database: &str, table: &str) -> CatalogResult<TableInfo> {
        let full_name = format!("{}.{}", database, table);
        let body: RestTable = self
            .fetch(
                &format!("/databases/{}/tables/{}", database, table),
                &format!("table '{}'", full_name),
            )
            .await?;
        Ok(body.into())
    }
}
