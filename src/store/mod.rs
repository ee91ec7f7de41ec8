// src/store/mod.rs
//! Row source / sink boundary
//!
//! The pipeline only needs two things from a database: an ordered, filtered,
//! limited range read, and a batched update by primary key. [`RowStore`]
//! captures exactly that; [`SqliteRowStore`] is the bundled implementation.

pub mod query;
mod sqlite;

use std::collections::BTreeMap;

pub use query::BatchQuery;
pub use rusqlite::types::Value;
pub use sqlite::SqliteRowStore;

use crate::checkpoint::{Checkpoint, KeyValue};
use crate::config::TableEncryptionConfig;
use crate::error::Result;

/// One fetched record: its key (None when NULL) and the target columns
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: Option<KeyValue>,
    pub values: BTreeMap<String, Value>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

/// Rows in ascending key order, at most one batch-size long
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    rows: Vec<Row>,
}

impl Batch {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resume point after this batch, `None` for an empty batch
    pub fn next_checkpoint(&self) -> Option<Checkpoint> {
        self.rows
            .last()
            .map(|row| Checkpoint::after_row(row.key.as_ref()))
    }
}

/// New column values for one row, in config column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange {
    pub key: KeyValue,
    pub assignments: Vec<(String, String)>,
}

/// Rows of a batch that need writing back, plus a count of the values that
/// were skipped because they already held ciphertext
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<RowChange>,
    already_encrypted: usize,
}

impl ChangeSet {
    pub fn push(&mut self, change: RowChange) {
        self.changes.push(change);
    }

    pub fn note_already_encrypted(&mut self) {
        self.already_encrypted += 1;
    }

    /// Values in the batch that were ciphertext before this pass saw them
    pub fn already_encrypted(&self) -> usize {
        self.already_encrypted
    }

    /// Nothing to write, but the batch did hold encrypted values: a batch
    /// whose update committed before its checkpoint could be recorded.
    pub fn is_replay(&self) -> bool {
        self.changes.is_empty() && self.already_encrypted > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Total column values staged across all rows
    pub fn values_encrypted(&self) -> usize {
        self.changes.iter().map(|c| c.assignments.len()).sum()
    }
}

pub trait RowStore {
    /// Run the range read described by `query`
    fn fetch_batch(&self, query: &BatchQuery) -> Result<Batch>;

    /// Apply every row change; each row is updated atomically. Returns the
    /// number of rows the store reports as updated.
    fn apply_changes(&mut self, table: &TableEncryptionConfig, changes: &ChangeSet)
        -> Result<usize>;
}
