// src/config/defaults.rs
use std::path::PathBuf;

use crate::config::app::{Features, Keys, Paths, PipelineSettings};
use crate::config::tables::{TableConfigs, TableEncryptionConfig};
use crate::consts::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_PATH, DEFAULT_CHECKPOINT_PERSIST_ATTEMPTS,
    DEFAULT_DATABASE_PATH, DEFAULT_TABLE_CONFIG_PATH,
};

// 32 bytes → AES-256, 16-byte IV
pub const DEFAULT_SECRET_KEY: &str = "dev-column-sweep-key-2025-000000";
pub const DEFAULT_IV: &str = "dev-iv-2025-0000";

pub fn default_keys() -> Keys {
    Keys {
        secret_key: DEFAULT_SECRET_KEY.into(),
        iv: DEFAULT_IV.into(),
        database_key: None,
    }
}

pub fn default_paths() -> Paths {
    Paths {
        database: PathBuf::from(DEFAULT_DATABASE_PATH),
        table_config: PathBuf::from(DEFAULT_TABLE_CONFIG_PATH),
        checkpoint_file: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
    }
}

pub fn default_pipeline() -> PipelineSettings {
    PipelineSettings {
        batch_size: DEFAULT_BATCH_SIZE,
        stop_on_unchanged_batch: true,
        checkpoint_persist_attempts: DEFAULT_CHECKPOINT_PERSIST_ATTEMPTS,
    }
}

pub fn default_features() -> Features {
    Features { use_dev_keys: true }
}

/// Example table set written out when no table config exists yet
pub fn default_table_configs() -> TableConfigs {
    TableConfigs::from_iter([
        TableEncryptionConfig::new("users", "user_id", ["email", "phone", "ssn"]),
        TableEncryptionConfig::new("orders", "order_id", ["credit_card"]),
    ])
}
