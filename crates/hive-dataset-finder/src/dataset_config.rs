// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Resolved per-dataset configuration.

use std::collections::BTreeMap;

use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
pub enum DatasetConfigError {
    #[snafu(display("Config key '{key}' has value '{value}', which is not a boolean"))]
    NotABoolean {
        key: String,
        value: String,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Effective key/value configuration of one dataset.
///
/// Keys are dotted paths (`hive.dataset.copy.target`). The map is ordered so
/// that two resolutions of the same inputs compare and print identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetConfig {
    entries: BTreeMap<String, String>,
}

impl DatasetConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a config from a JSON document, flattening nested objects into
    /// dotted keys.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut entries = BTreeMap::new();
        flatten_json("", value, &mut entries);
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Read a boolean, accepting `true/yes/on` and `false/no/off` in any case.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, DatasetConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => NotABooleanSnafu { key, value }.fail(),
        }
    }

    /// True if any key equals `path` or lies under `path.`.
    pub fn has_path(&self, path: &str) -> bool {
        self.entries
            .keys()
            .any(|k| k == path || is_under(k, path))
    }

    /// Keys under `prefix`, with the prefix and its separator stripped.
    ///
    /// A leaf stored exactly at `prefix` has no sub-keys and is dropped. A
    /// prefix that is absent entirely yields an empty config.
    pub fn sub_config(&self, prefix: &str) -> DatasetConfig {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| is_under(k, prefix))
            .map(|(k, v)| (k[prefix.len() + 1..].to_string(), v.clone()))
            .collect();
        DatasetConfig { entries }
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
}

impl<K, V> FromIterator<(K, V)> for DatasetConfig
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

fn is_under(key: &str, prefix: &str) -> bool {
    key.len() > prefix.len() + 1
        && key.starts_with(prefix)
        && key.as_bytes()[prefix.len()] == b'.'
}

/// Flatten a JSON document into dotted keys.
///
/// Scalars become their textual form, `null` is skipped and arrays are kept
/// as JSON text.
pub(crate) fn flatten_json(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut BTreeMap<String, String>,
) {
    use serde_json::Value;

    let key = |k: &str| {
        if prefix.is_empty() {
            k.to_string()
        } else {
            format!("{}.{}", prefix, k)
        }
    };

    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_json(&key(k), v, out);
            }
        }
        Value::Null => {}
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
            out.insert(prefix.to_string(), value.to_string());
        }
    }
}
