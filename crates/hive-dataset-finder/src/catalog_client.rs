// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Catalog client trait and table metadata types.
//!
//! This module defines the abstract interface the finder uses to browse a
//! Hive-style metadata catalog: a flat list of databases, each holding a flat
//! list of tables. Any metastore front-end (REST gateway, Thrift bridge, an
//! in-memory fixture) can be plugged in by implementing [`CatalogClient`].

use std::collections::HashMap;

use async_trait::async_trait;

/// Metadata about a column in a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    /// Hive type string (e.g., "int", "decimal(10,2)", "array<string>").
    pub type_text: String,
    /// Column position (0-based).
    pub position: i32,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_text: impl Into<String>, position: i32) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
            position,
            nullable: true,
            comment: None,
        }
    }
}

/// Data format of the underlying storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceFormat {
    Parquet,
    Orc,
    Avro,
    Text,
    Csv,
    Json,
    SequenceFile,
    Other(String),
}

impl DataSourceFormat {
    /// Parse the catalog's format label. Unknown labels are preserved verbatim.
    pub fn parse(label: Option<&str>) -> Self {
        match label.map(|l| l.to_uppercase()).as_deref() {
            Some("PARQUET") => Self::Parquet,
            Some("ORC") => Self::Orc,
            Some("AVRO") => Self::Avro,
            Some("TEXT") | Some("TEXTFILE") => Self::Text,
            Some("CSV") => Self::Csv,
            Some("JSON") => Self::Json,
            Some("SEQUENCEFILE") => Self::SequenceFile,
            Some(_) => Self::Other(label.unwrap_or_default().to_string()),
            None => Self::Other("UNKNOWN".to_string()),
        }
    }
}

/// Type of table as reported by the metastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableType {
    Managed,
    External,
    View,
    Other(String),
}

impl TableType {
    pub fn parse(label: &str) -> Self {
        match label.to_uppercase().as_str() {
            "MANAGED_TABLE" | "MANAGED" => Self::Managed,
            "EXTERNAL_TABLE" | "EXTERNAL" => Self::External,
            "VIRTUAL_VIEW" | "MATERIALIZED_VIEW" | "VIEW" => Self::View,
            _ => Self::Other(label.to_string()),
        }
    }
}

/// Full table record as returned by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub db_name: String,
    pub table_name: String,
    pub owner: Option<String>,
    pub table_type: TableType,
    pub data_source_format: DataSourceFormat,
    pub columns: Vec<ColumnInfo>,
    pub partition_keys: Vec<ColumnInfo>,
    pub storage_location: Option<String>,
    pub parameters: HashMap<String, String>,
    pub create_time: Option<i64>,
}

impl TableInfo {
    /// A managed table with no columns and no storage location.
    pub fn new(db_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            table_name: table_name.into(),
            owner: None,
            table_type: TableType::Managed,
            data_source_format: DataSourceFormat::Other("UNKNOWN".to_string()),
            columns: Vec::new(),
            partition_keys: Vec::new(),
            storage_location: None,
            parameters: HashMap::new(),
            create_time: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnInfo>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_partition_keys(mut self, partition_keys: Vec<ColumnInfo>) -> Self {
        self.partition_keys = partition_keys;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.storage_location = Some(location.into());
        self
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_keys.is_empty()
    }
}

/// Errors that can occur during catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Network or HTTP error.
    ConnectionError(String),
    /// Database or table not found.
    NotFound(String),
    /// Authentication or authorization failure.
    AuthError(String),
    /// Invalid or unparsable response from the catalog server.
    InvalidResponse(String),
    /// Failed to map a catalog column type to an Arrow type.
    TypeMappingError(String),
    /// Other errors.
    Other(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(msg) => write!(f, "Catalog connection error: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::AuthError(msg) => write!(f, "Auth error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Self::TypeMappingError(msg) => write!(f, "Type mapping error: {}", msg),
            Self::Other(msg) => write!(f, "Catalog error: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Abstract client for browsing a Hive-style metadata catalog.
///
/// Implementations are leased from a
/// [`CatalogClientPool`](crate::client_pool::CatalogClientPool) for the
/// duration of one enumeration step, so they should not hold per-call state.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Human-readable name of this client (e.g., "rest-catalog").
    fn name(&self) -> &str;

    /// List all database names, in catalog order.
    async fn list_databases(&self) -> CatalogResult<Vec<String>>;

    /// List all table names within a database, in catalog order.
    async fn list_tables(&self, database: &str) -> CatalogResult<Vec<String>>;

    /// Fetch the full table record, including columns and storage information.
    async fn get_table(&self, database: &str, table: &str) -> CatalogResult<TableInfo>;
}
