// src/config/tables.rs
//! Which tables and columns get encrypted
//!
//! Stored as JSON keyed by table name:
//!
//! ```json
//! { "users": { "tableName": "users", "primaryKey": "user_id",
//!              "columnsToEncrypt": ["email", "phone", "ssn"] } }
//! ```
//!
//! The file is re-read before every run so edits take effect without a
//! restart. A missing file is replaced by an example set.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::defaults::default_table_configs;
use crate::error::{CoreError, Result};
use crate::util::{is_plain_identifier, write_atomic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableEncryptionConfig {
    pub table_name: String,
    pub primary_key: String,
    pub columns_to_encrypt: Vec<String>,
}

impl TableEncryptionConfig {
    pub fn new<I, C>(table_name: &str, primary_key: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            table_name: table_name.to_string(),
            primary_key: primary_key.to_string(),
            columns_to_encrypt: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let table = &self.table_name;
        let invalid = |msg: String| Err(CoreError::Config(format!("table {table:?}: {msg}")));

        if !is_plain_identifier(table) {
            return invalid("tableName is not a plain SQL identifier".into());
        }
        if !is_plain_identifier(&self.primary_key) || self.primary_key.contains('.') {
            return invalid(format!("bad primaryKey {:?}", self.primary_key));
        }
        if self.columns_to_encrypt.is_empty() {
            return invalid("columnsToEncrypt is empty".into());
        }

        let mut seen = HashSet::new();
        for column in &self.columns_to_encrypt {
            if !is_plain_identifier(column) || column.contains('.') {
                return invalid(format!("bad column name {column:?}"));
            }
            if column == &self.primary_key {
                return invalid(format!("primary key {column:?} cannot be encrypted"));
            }
            if !seen.insert(column.as_str()) {
                return invalid(format!("column {column:?} listed twice"));
            }
        }
        Ok(())
    }
}

/// Table configs in iteration (name) order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableConfigs(BTreeMap<String, TableEncryptionConfig>);

impl TableConfigs {
    pub fn get(&self, table: &str) -> Option<&TableEncryptionConfig> {
        self.0.get(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEncryptionConfig> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, config: TableEncryptionConfig) {
        self.0.insert(config.table_name.clone(), config);
    }

    /// Every entry valid, and keyed by its own `tableName`
    pub fn validate(&self) -> Result<()> {
        for (key, config) in &self.0 {
            if key != &config.table_name {
                return Err(CoreError::Config(format!(
                    "entry {key:?} declares tableName {:?}",
                    config.table_name
                )));
            }
            config.validate()?;
        }
        Ok(())
    }
}

impl FromIterator<TableEncryptionConfig> for TableConfigs {
    fn from_iter<T: IntoIterator<Item = TableEncryptionConfig>>(iter: T) -> Self {
        let mut configs = TableConfigs::default();
        for config in iter {
            configs.insert(config);
        }
        configs
    }
}

/// JSON file holding the table configs
#[derive(Debug, Clone)]
pub struct TableConfigSource {
    path: PathBuf,
}

impl TableConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate; a missing file is bootstrapped with the example set
    pub fn load(&self) -> Result<TableConfigs> {
        if !self.path.exists() {
            tracing::error!(
                path = %self.path.display(),
                "table config not found, writing example configuration"
            );
            let configs = default_table_configs();
            // A failed save is only logged; this run still uses the example set
            if let Err(e) = self.save(&configs) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "could not save example table config"
                );
            }
            return Ok(configs);
        }

        let bytes = std::fs::read(&self.path)?;
        let configs: TableConfigs = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Config(format!("{}: {e}", self.path.display())))?;
        configs.validate()?;
        tracing::info!(tables = configs.len(), "table encryption config loaded");
        Ok(configs)
    }

    pub fn save(&self, configs: &TableConfigs) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(configs)?;
        write_atomic(&self.path, &json)?;
        tracing::info!(path = %self.path.display(), "table encryption config saved");
        Ok(())
    }
}
