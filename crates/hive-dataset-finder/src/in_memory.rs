// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! A catalog held entirely in memory. Databases and tables are listed in
//! insertion order.

use async_trait::async_trait;

use crate::catalog_client::{CatalogClient, CatalogError, CatalogResult, TableInfo};

#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    databases: Vec<(String, Vec<TableInfo>)>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty database. A no-op if it already exists.
    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database_mut(name.into());
        self
    }

    /// Add a table, creating its database on first use.
    pub fn with_table(mut self, table: TableInfo) -> Self {
        let tables = self.database_mut(table.db_name.clone());
        tables.retain(|t| t.table_name != table.table_name);
        tables.push(table);
        self
    }

    fn database_mut(&mut self, name: String) -> &mut Vec<TableInfo> {
        let idx = match self.databases.iter().position(|(db, _)| *db == name) {
            Some(idx) => idx,
            None => {
                self.databases.push((name, Vec::new()));
                self.databases.len() - 1
            }
        };
        &mut self.databases[idx].1
    }

    fn tables(&self, database: &str) -> CatalogResult<&[TableInfo]> {
        self.databases
            .iter()
            .find(|(db, _)| db == database)
            .map(|(_, tables)| tables.as_slice())
            .ok_or_else(|| CatalogError::NotFound(format!("database '{}'", database)))
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn list_databases(&self) -> CatalogResult<Vec<String>> {
        Ok(self.databases.iter().map(|(db, _)| db.clone()).collect())
    }

    async fn list_tables(&self, database: &str) -> CatalogResult<Vec<String>> {
        Ok(self
            .tables(database)?
            .iter()
            .map(|t| t.table_name.clone())
            .collect())
    }

    async fn get_table(&self, database: &str, table: &str) -> CatalogResult<TableInfo> {
        self.tables(database)?
            .iter()
            .find(|t| t.table_name == table)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("table '{}.{}'", database, table)))
    }
}
