// src/error.rs
//! Public error types for the entire crate

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto operation failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Row store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Table {table}: primary key {column} holds unsupported {kind} value")]
    UnsupportedKey {
        table: String,
        column: String,
        kind: &'static str,
    },

    #[error("Table {table}: cursor did not advance past {previous}")]
    NonMonotonicCursor { table: String, previous: String },

    #[error("Failed to persist checkpoints to {}: {source}", path.display())]
    CheckpointPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Errors the pipeline driver absorbs at table level: the table aborts,
    /// its durable checkpoint stays where it was and the run moves on.
    pub fn is_table_scoped(&self) -> bool {
        matches!(
            self,
            CoreError::Crypto(_)
                | CoreError::Store(_)
                | CoreError::UnsupportedKey { .. }
                | CoreError::NonMonotonicCursor { .. }
                | CoreError::CheckpointPersist { .. }
        )
    }
}

/// Failures of the column cipher
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("IV must be 16 bytes, got {0}")]
    InvalidIvLength(usize),

    #[error("malformed key encoding: {0}")]
    KeyEncoding(String),

    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ciphertext length {0} is not a non-zero multiple of the block size")]
    BlockLength(usize),

    #[error("bad padding (wrong key/IV or corrupted ciphertext)")]
    Padding,

    #[error("decrypted bytes are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
