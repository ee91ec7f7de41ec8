// src/pipeline/driver.rs
//! Per-table scan loop
//!
//! ```text
//! SCANNING ──fetch──▶ empty batch ─────────────────────────────▶ DONE
//!    ▲                rows ──encrypt──▶ nothing staged ─────────▶ DONE
//!    │                                  (or advance, if configured)
//!    │                                  changes ──▶ PERSISTING
//!    └──── update rows, record checkpoint ◀────────────┘
//! any error ─────────────────────────────────────────────────────▶ FAILED
//! ```
//!
//! DONE clears the table's checkpoint. FAILED leaves the last durable one in
//! place so the next run resumes from it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::encryptor::BatchEncryptor;
use super::fetcher::fetch_batch;
use super::report::{RunReport, TableOutcome, TableReport};
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::{Config, PipelineSettings, TableConfigSource, TableEncryptionConfig};
use crate::consts::{DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_PERSIST_ATTEMPTS};
use crate::crypto::ColumnCipher;
use crate::error::{CoreError, Result};
use crate::store::{ChangeSet, RowStore, SqliteRowStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub batch_size: usize,
    /// End the scan at the first batch with no values left to encrypt.
    /// Batches that are already ciphertext do not count.
    pub stop_on_unchanged_batch: bool,
    pub checkpoint_persist_attempts: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            stop_on_unchanged_batch: true,
            checkpoint_persist_attempts: DEFAULT_CHECKPOINT_PERSIST_ATTEMPTS,
        }
    }
}

impl From<&PipelineSettings> for PipelineOptions {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            stop_on_unchanged_batch: settings.stop_on_unchanged_batch,
            checkpoint_persist_attempts: settings.checkpoint_persist_attempts,
        }
    }
}

enum ScanState {
    Scanning,
    Persisting { changes: ChangeSet, next: Checkpoint },
}

enum Step {
    Next(ScanState),
    Done,
    Failed(CoreError),
}

pub struct Pipeline<S: RowStore> {
    store: S,
    checkpoints: Arc<CheckpointStore>,
    cipher: ColumnCipher,
    tables: TableConfigSource,
    options: PipelineOptions,
}

impl Pipeline<SqliteRowStore> {
    /// Open the database and checkpoint file named by `config` and check the
    /// table configs once up front.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cipher = config.cipher()?;
        let tables = TableConfigSource::new(&config.paths.table_config);
        tables.load()?;

        let store =
            SqliteRowStore::open(&config.paths.database, config.keys.database_key.as_deref())?;
        let checkpoints = Arc::new(CheckpointStore::open(&config.paths.checkpoint_file)?);

        info!(
            algorithm = cipher.algorithm(),
            fingerprint = %cipher.key_fingerprint(),
            database = %config.paths.database.display(),
            "pipeline initialised"
        );

        Ok(Self::new(
            store,
            checkpoints,
            cipher,
            tables,
            PipelineOptions::from(&config.pipeline),
        ))
    }
}

impl<S: RowStore> Pipeline<S> {
    pub fn new(
        store: S,
        checkpoints: Arc<CheckpointStore>,
        cipher: ColumnCipher,
        tables: TableConfigSource,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            checkpoints,
            cipher,
            tables,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn checkpoints(&self) -> &Arc<CheckpointStore> {
        &self.checkpoints
    }

    pub fn cipher(&self) -> &ColumnCipher {
        &self.cipher
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(self.cipher.encrypt(plaintext)?)
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(self.cipher.decrypt(ciphertext)?)
    }

    /// One full pass over every configured table.
    ///
    /// Table configs are re-read first. Nothing in here returns an error:
    /// failures are logged and recorded in the report.
    pub fn run(&mut self) -> RunReport {
        let started_at = Utc::now();
        info!("=== column encryption run started ===");

        let configs = match self.tables.load() {
            Ok(configs) => configs,
            Err(e) => {
                error!(
                    path = %self.tables.path().display(),
                    error = %e,
                    "could not load table configs, run skipped"
                );
                return RunReport {
                    started_at,
                    finished_at: Utc::now(),
                    config_error: Some(e.to_string()),
                    tables: Vec::new(),
                };
            }
        };

        let tables = configs
            .iter()
            .map(|config| self.encrypt_table(config))
            .collect();

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            config_error: None,
            tables,
        };
        info!(
            completed = report.completed(),
            aborted = report.aborted(),
            "=== column encryption run finished ==="
        );
        report
    }

    /// Scan one table from its checkpoint to the end (or to the first error)
    pub fn encrypt_table(&mut self, config: &TableEncryptionConfig) -> TableReport {
        let table = config.table_name.as_str();
        let mut cursor = self.checkpoints.get(table);
        let mut report = TableReport::started(table, cursor.clone());
        info!(table, resume_from = %cursor, "processing table");

        let mut state = ScanState::Scanning;
        let result = loop {
            let step = match state {
                ScanState::Scanning => self.scan(config, &cursor, &mut report),
                ScanState::Persisting { changes, next } => {
                    self.persist(config, &changes, next, &mut cursor, &mut report)
                }
            };
            match step {
                Step::Next(next_state) => state = next_state,
                Step::Done => break self.checkpoints.clear(table),
                Step::Failed(e) => break Err(e),
            }
        };

        report.final_checkpoint = self.checkpoints.get(table);
        match result {
            Ok(()) => info!(
                table,
                batches = report.batches,
                rows = report.rows_scanned,
                updated = report.rows_updated,
                already_encrypted = report.values_already_encrypted,
                "table encryption complete"
            ),
            Err(e) => {
                error!(
                    table,
                    checkpoint = %report.final_checkpoint,
                    error = %e,
                    "table aborted, will resume from last checkpoint"
                );
                report.outcome = TableOutcome::Aborted {
                    reason: e.to_string(),
                };
            }
        }
        report
    }

    fn scan(
        &self,
        config: &TableEncryptionConfig,
        cursor: &Checkpoint,
        report: &mut TableReport,
    ) -> Step {
        let batch = match fetch_batch(&self.store, config, cursor, self.options.batch_size) {
            Ok(batch) => batch,
            Err(e) => return Step::Failed(e),
        };
        let Some(next) = batch.next_checkpoint() else {
            return Step::Done;
        };
        report.batches += 1;
        report.rows_scanned += batch.len();

        if !cursor.advances_to(&next) {
            return Step::Failed(CoreError::NonMonotonicCursor {
                table: config.table_name.clone(),
                previous: cursor.to_string(),
            });
        }

        let changes = match BatchEncryptor::new(&self.cipher).apply(config, &batch) {
            Ok(changes) => changes,
            Err(e) => return Step::Failed(e.into()),
        };

        report.values_already_encrypted += changes.already_encrypted();

        // A batch of ciphertext is one whose update committed before its
        // checkpoint did; step past it instead of ending the scan.
        if changes.is_replay() {
            debug!(
                table = %config.table_name,
                rows = batch.len(),
                already_encrypted = changes.already_encrypted(),
                "batch already encrypted, advancing"
            );
        } else if changes.is_empty() && self.options.stop_on_unchanged_batch {
            debug!(
                table = %config.table_name,
                rows = batch.len(),
                "batch has no values to encrypt, ending scan"
            );
            return Step::Done;
        }
        Step::Next(ScanState::Persisting { changes, next })
    }

    fn persist(
        &mut self,
        config: &TableEncryptionConfig,
        changes: &ChangeSet,
        next: Checkpoint,
        cursor: &mut Checkpoint,
        report: &mut TableReport,
    ) -> Step {
        let table = config.table_name.as_str();

        if !changes.is_empty() {
            match self.store.apply_changes(config, changes) {
                Ok(updated) => report.rows_updated += updated,
                Err(e) => return Step::Failed(e),
            }
            report.values_encrypted += changes.values_encrypted();
        }

        if let Err(e) = self.record_checkpoint(table, &next) {
            return Step::Failed(e);
        }
        info!(
            table,
            batch = report.batches,
            processed = report.rows_scanned,
            checkpoint = %next,
            "batch committed"
        );
        *cursor = next;
        Step::Next(ScanState::Scanning)
    }

    fn record_checkpoint(&self, table: &str, next: &Checkpoint) -> Result<()> {
        let attempts = self.options.checkpoint_persist_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.checkpoints.set(table, next.clone()) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(table, attempt, error = %e, "checkpoint persist failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
