// src/consts.rs
//! Shared constants: pipeline defaults and file locations

/// Rows fetched per batch when the config does not say otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Attempts to durably record a checkpoint before a table gives up
pub const DEFAULT_CHECKPOINT_PERSIST_ATTEMPTS: u32 = 3;

/// AES block (and CBC IV) size in bytes
pub const AES_BLOCK_LEN: usize = 16;

/// Bytes of SHA-256(key ‖ iv) shown as the key fingerprint
pub const KEY_FINGERPRINT_LEN: usize = 8;

/// Default application config file, overridable with `ECS_CONFIG`
pub const DEFAULT_CONFIG_FILE: &str = "dev-config.toml";

pub const DEFAULT_DATABASE_PATH: &str = "data/app.db";
pub const DEFAULT_TABLE_CONFIG_PATH: &str = "data/encryption-config.json";
pub const DEFAULT_CHECKPOINT_PATH: &str = "data/encryption-checkpoints.json";

/// Prefixes accepted on key / IV strings; anything else is taken as raw UTF-8
pub const HEX_SECRET_PREFIX: &str = "hex:";
pub const BASE64_SECRET_PREFIX: &str = "base64:";
