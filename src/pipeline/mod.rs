// src/pipeline/mod.rs
//! Incremental, resumable column encryption
//!
//! fetch → encrypt → update rows → record checkpoint, per table, until the
//! table runs dry.

mod driver;
pub mod encryptor;
pub mod fetcher;
mod report;

pub use driver::{Pipeline, PipelineOptions};
pub use encryptor::BatchEncryptor;
pub use fetcher::fetch_batch;
pub use report::{RunReport, TableOutcome, TableReport};
