// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

use snafu::{Location, Snafu};

use crate::catalog_client::CatalogError;
use crate::config_resolver::ConfigResolutionError;
use crate::config_store::ConfigStoreError;
use crate::dataset::DatasetError;
use crate::dataset_config::DatasetConfigError;
use crate::whitelist_blacklist::PatternError;

/// Errors that abort finder construction or a whole discovery pass.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FinderError {
    #[snafu(display("Must specify {db_key} or {whitelist_key}"))]
    MissingDatasetSelection {
        db_key: &'static str,
        whitelist_key: &'static str,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid dataset selection: {source}"))]
    InvalidPattern {
        source: PatternError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to create the catalog client pool: {source}"))]
    CatalogPool {
        source: CatalogError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to create the config store client: {source}"))]
    ConfigStoreClient {
        source: ConfigStoreError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to list tables from the catalog: {source}"))]
    CatalogListing {
        source: CatalogError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Errors that sink a single dataset. The finder reports and skips them.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatasetResolutionError {
    #[snafu(display("Catalog request failed: {source}"))]
    CatalogRequest {
        source: CatalogError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    ConfigResolution {
        source: ConfigResolutionError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Cannot read the blacklist flag: {source}"))]
    BlacklistFlag {
        source: DatasetConfigError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    Construction {
        source: DatasetError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, FinderError>;
