// src/config/mod.rs
//! Configuration system for encrypted-column-sweep
//!
//! Application settings come from TOML + env overrides; the per-table
//! encryption plan is a separate JSON document reloaded before every run.

pub use app::{Config, Features, Keys, Paths, PipelineSettings};
pub use defaults::default_table_configs;
pub use tables::{TableConfigSource, TableConfigs, TableEncryptionConfig};

pub mod app;
mod defaults;
mod tables;
