//! Custom property sets built from `name=value` pairs and JSON files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Invalid or missing user configuration. Always raised before any network
/// call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GitHub token is required; provide it via --token or the GITHUB_TOKEN environment variable")]
    MissingToken,

    #[error("empty property provided")]
    EmptyProperty,

    #[error("invalid property format: {0}; expected 'name=value'")]
    MalformedProperty(String),

    #[error("property name cannot be empty in: {0}")]
    EmptyName(String),

    #[error("failed to read properties file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse properties file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("properties file {0} must contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("property '{name}' in {path} must have a string value")]
    NonStringValue { path: PathBuf, name: String },

    #[error("no properties specified; use --property or --properties-file")]
    NoProperties,
}

/// Parses a single `name=value` pair.
///
/// Both sides are trimmed and the value may itself contain `=`.
pub fn parse_pair(input: &str) -> Result<(String, String), ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::EmptyProperty);
    }

    let Some((name, value)) = input.split_once('=') else {
        return Err(ConfigError::MalformedProperty(input.to_string()));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyName(input.to_string()));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

/// Property names mapped to values, applied in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    values: BTreeMap<String, String>,
}

impl PropertySet {
    /// Loads properties from a JSON object of string values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;

        let Value::Object(map) = parsed else {
            return Err(ConfigError::NotAnObject(path.to_path_buf()));
        };

        let mut values = BTreeMap::new();
        for (name, value) in map {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyName(path.display().to_string()));
            }
            let Value::String(value) = value else {
                return Err(ConfigError::NonStringValue {
                    path: path.to_path_buf(),
                    name,
                });
            };
            values.insert(name, value);
        }

        Ok(Self { values })
    }

    /// Builds the property set from an optional file and command-line pairs.
    ///
    /// Pairs override file entries with the same name. An empty result is an
    /// error.
    pub fn from_sources(pairs: &[String], file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut set = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        for pair in pairs {
            let (name, value) = parse_pair(pair)?;
            set.values.insert(name, value);
        }

        if set.is_empty() {
            return Err(ConfigError::NoProperties);
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
