// src/lib.rs
//! encrypted-column-sweep: resumable in-place encryption of sensitive columns
//!
//! Features:
//! - Deterministic AES-CBC column cipher with a fixed key + IV
//! - Bounded, key-ordered batch scans over SQLite / SQLCipher tables
//! - Crash-safe checkpoints (atomic rename, single-lock persistence)
//! - Skips values that are already ciphertext, so re-scans are harmless

pub mod aliases;
pub mod checkpoint;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod util;

// Re-export everything users need at the crate root
pub use checkpoint::{Checkpoint, CheckpointStore, KeyValue};
pub use config::{Config, TableConfigSource, TableConfigs, TableEncryptionConfig};
pub use crypto::ColumnCipher;
pub use error::{CoreError, CryptoError, Result as CoreResult};
pub use pipeline::{Pipeline, PipelineOptions, RunReport, TableOutcome, TableReport};
pub use store::{RowStore, SqliteRowStore};
