// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Job properties and the configuration keys the finder recognizes.
//!
//! Properties are a flat, ordered map of dotted keys. They can be built in
//! code or loaded from a TOML file with [Figment], in which case nested tables
//! are flattened (`[hive.dataset] database = "sales"` becomes
//! `hive.dataset.database = sales`).
//!
//! ## Priority chain
//!
//! | Priority | Source |
//! |----------|--------|
//! | 1 (highest) | `HIVE_FINDER_*` env vars (`__` separates nested keys, values kept verbatim) |
//! | 2 | TOML file values |

use std::collections::BTreeMap;
use std::path::Path;

use figment::providers::{Env, Format as _, Toml};
use figment::Figment;
use snafu::{Location, ResultExt, Snafu};

use crate::dataset_config::{flatten_json, DatasetConfig};

pub const HIVE_DATASET_PREFIX: &str = "hive.dataset";
pub const HIVE_METASTORE_URI_KEY: &str = "hive.dataset.hive.metastore.uri";
pub const DB_KEY: &str = "hive.dataset.database";
pub const TABLE_PATTERN_KEY: &str = "hive.dataset.table.pattern";
pub const DEFAULT_TABLE_PATTERN: &str = "*";
pub const WHITELIST_KEY: &str = "hive.dataset.whitelist";
pub const BLACKLIST_KEY: &str = "hive.dataset.blacklist";

/// Only keys under this prefix are handed to a dataset. The same dataset
/// config can then serve several pipelines, e.g. `hive.dataset.copy` for
/// copies and `hive.dataset.retention` for retention.
pub const HIVE_DATASET_CONFIG_PREFIX_KEY: &str = "hive.dataset.configPrefix";

/// Per-dataset opt-out flag, read from the resolved dataset config.
pub const HIVE_DATASET_IS_BLACKLISTED_KEY: &str = "is.blacklisted";

pub const CONFIG_MANAGEMENT_STORE_URI_KEY: &str = "gobblin.config.management.store.uri";

pub const DEFAULT_METASTORE_URI: &str = "http://localhost:9083";

/// Environment variable prefix for overrides applied by [`Properties::load`].
pub const ENV_PREFIX: &str = "HIVE_FINDER_";

const RECOGNIZED_KEYS: &[&str] = &[
    HIVE_METASTORE_URI_KEY,
    DB_KEY,
    TABLE_PATTERN_KEY,
    WHITELIST_KEY,
    BLACKLIST_KEY,
    HIVE_DATASET_CONFIG_PREFIX_KEY,
    HIVE_DATASET_IS_BLACKLISTED_KEY,
    CONFIG_MANAGEMENT_STORE_URI_KEY,
];

#[derive(Debug, Snafu)]
pub enum PropertiesError {
    #[snafu(display("Failed to load job properties: {source}"))]
    Load {
        source: figment::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Flat job configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load properties from a TOML file, with `HIVE_FINDER_*` env overrides.
    ///
    /// See the [module-level docs](self) for the priority chain.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PropertiesError> {
        Self::load_with_env(path, Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Env values are kept verbatim (`007` stays `007`) and their keys, which
    /// arrive lowercased, are matched back to the recognized keys ignoring
    /// case, so `HIVE_FINDER_HIVE__DATASET__CONFIGPREFIX` sets
    /// `hive.dataset.configPrefix`.
    fn load_with_env(path: impl AsRef<Path>, env: Env) -> Result<Self, PropertiesError> {
        let mut properties = Self::from_figment(&Figment::new().merge(Toml::file(path.as_ref())))?;
        for (key, value) in env.iter() {
            properties.set(canonical_key(key.as_str()), value);
        }
        Ok(properties)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, PropertiesError> {
        let value: serde_json::Value = figment.extract().context(LoadSnafu)?;
        let mut entries = BTreeMap::new();
        flatten_json("", &value, &mut entries);
        Ok(Self { entries })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole job configuration viewed as a dataset config.
    pub fn to_dataset_config(&self) -> DatasetConfig {
        self.iter().collect()
    }
}

fn canonical_key(key: &str) -> String {
    RECOGNIZED_KEYS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(key))
        .map_or_else(|| key.to_string(), |known| known.to_string())
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
