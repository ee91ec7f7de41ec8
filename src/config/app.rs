// src/config/app.rs
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::defaults::*;
use crate::consts::DEFAULT_CONFIG_FILE;
use crate::crypto::ColumnCipher;
use crate::error::{CoreError, Result};

pub const ENV_CONFIG: &str = "ECS_CONFIG";
pub const ENV_DATABASE: &str = "ECS_DATABASE";
pub const ENV_TABLE_CONFIG: &str = "ECS_TABLE_CONFIG";
pub const ENV_CHECKPOINT_FILE: &str = "ECS_CHECKPOINT_FILE";
pub const ENV_SECRET_KEY: &str = "ECS_SECRET_KEY";
pub const ENV_IV: &str = "ECS_IV";
pub const ENV_DB_KEY: &str = "ECS_DB_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_keys")]
    pub keys: Keys,
    #[serde(default = "default_paths")]
    pub paths: Paths,
    #[serde(default = "default_pipeline")]
    pub pipeline: PipelineSettings,
    #[serde(default = "default_features")]
    pub features: Features,
}

#[derive(Clone, Deserialize)]
pub struct Keys {
    pub secret_key: String,
    pub iv: String,
    #[serde(default)]
    pub database_key: Option<String>,
}

// Never print key material
impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("secret_key", &"<redacted>")
            .field("iv", &"<redacted>")
            .field("database_key", &self.database_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paths {
    pub database: PathBuf,
    pub table_config: PathBuf,
    pub checkpoint_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_stop_on_unchanged")]
    pub stop_on_unchanged_batch: bool,
    #[serde(default = "default_persist_attempts")]
    pub checkpoint_persist_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Features {
    pub use_dev_keys: bool,
}

fn default_batch_size() -> usize {
    default_pipeline().batch_size
}

fn default_stop_on_unchanged() -> bool {
    default_pipeline().stop_on_unchanged_batch
}

fn default_persist_attempts() -> u32 {
    default_pipeline().checkpoint_persist_attempts
}

impl Default for Config {
    fn default() -> Self {
        Config {
            keys: default_keys(),
            paths: default_paths(),
            pipeline: default_pipeline(),
            features: default_features(),
        }
    }
}

impl Config {
    /// Load from `ECS_CONFIG` (or `dev-config.toml`) and apply env overrides
    pub fn load() -> Result<Config> {
        let path = std::env::var(ENV_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load a specific file; falls back to built-in defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Config> {
        let mut conf = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::warn!(
                path = %path.display(),
                "config file not found, using built-in defaults"
            );
            Config::default()
        };

        conf.apply_overrides(|name| std::env::var(name).ok())?;
        conf.validate()?;
        Ok(conf)
    }

    /// Parse TOML without touching the environment
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let conf: Config = toml::from_str(content)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Path overrides always apply; key overrides are mandatory once dev keys
    /// are switched off.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DATABASE) {
            self.paths.database = db.into();
        }
        if let Some(tables) = lookup(ENV_TABLE_CONFIG) {
            self.paths.table_config = tables.into();
        }
        if let Some(checkpoints) = lookup(ENV_CHECKPOINT_FILE) {
            self.paths.checkpoint_file = checkpoints.into();
        }

        if !self.features.use_dev_keys {
            let required = |name: &str| {
                lookup(name).ok_or_else(|| {
                    CoreError::Config(format!("{name} is required when use_dev_keys = false"))
                })
            };
            self.keys.secret_key = required(ENV_SECRET_KEY)?;
            self.keys.iv = required(ENV_IV)?;
            if let Some(db_key) = lookup(ENV_DB_KEY) {
                self.keys.database_key = Some(db_key);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.batch_size == 0 {
            return Err(CoreError::Config("pipeline.batch_size must be at least 1".into()));
        }
        if self.pipeline.checkpoint_persist_attempts == 0 {
            return Err(CoreError::Config(
                "pipeline.checkpoint_persist_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the process-wide column cipher from `[keys]`
    pub fn cipher(&self) -> Result<ColumnCipher> {
        Ok(ColumnCipher::from_secrets(&self.keys.secret_key, &self.keys.iv)?)
    }
}
