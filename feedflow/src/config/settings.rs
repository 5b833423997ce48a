//! Plain key/value settings read from a TOML file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use toml::Value;

use crate::errors::{FeedflowError, Result};

/// Flat string settings with per-key defaults at lookup time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Creates empty settings; every lookup yields its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from a file. A missing file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FeedflowError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from TOML text.
    ///
    /// Only top-level keys are read. Scalars are stringified and arrays of
    /// scalars are joined with commas, so `ALLOWED_FETCH_NUMBER = [20, 200]`
    /// and `ALLOWED_FETCH_NUMBER = "20,200"` are equivalent.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| FeedflowError::Config(e.message().to_string()))?;

        let mut values = HashMap::with_capacity(table.len());
        for (key, value) in table {
            let text = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| scalar_to_string(&key, item))
                    .collect::<Result<Vec<_>>>()?
                    .join(","),
                other => scalar_to_string(&key, &other)?,
            };
            values.insert(key, text);
        }
        Ok(Self { values })
    }

    /// Sets one value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Value for `key`, or `default` when unset or empty.
    #[must_use]
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(value) if !value.trim().is_empty() => value.as_str(),
            _ => default,
        }
    }

    /// Comma-separated list for `key`, empty entries dropped.
    #[must_use]
    pub fn get_list(&self, key: &str, default: &str) -> Vec<String> {
        self.get(key, default)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Parses `key` as an unsigned integer.
    pub fn get_usize(&self, key: &str, default: &str) -> Result<usize> {
        let raw = self.get(key, default).trim();
        raw.parse()
            .map_err(|_| FeedflowError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
    }

    /// Parses `key` as a boolean (`true/false`, `1/0`, `yes/no`, `on/off`).
    pub fn get_bool(&self, key: &str, default: &str) -> Result<bool> {
        let raw = self.get(key, default).trim();
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(FeedflowError::Config(format!("{key} must be a boolean, got '{raw}'"))),
        }
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(d) => Ok(d.to_string()),
        Value::Array(_) | Value::Table(_) => Err(FeedflowError::Config(format!(
            "{key} must be a plain value or a list of plain values"
        ))),
    }
}
