// src/pipeline/report.rs
use chrono::{DateTime, Utc};

use crate::checkpoint::Checkpoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// Scan reached its end and the checkpoint was cleared
    Completed,
    /// Scan stopped on an error; the last durable checkpoint was kept
    Aborted { reason: String },
}

/// What one table's scan did during a run
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub outcome: TableOutcome,
    pub resumed_from: Checkpoint,
    pub final_checkpoint: Checkpoint,
    pub batches: usize,
    pub rows_scanned: usize,
    pub rows_updated: usize,
    pub values_encrypted: usize,
    /// Values found already encrypted, typically a replayed batch
    pub values_already_encrypted: usize,
}

impl TableReport {
    pub(crate) fn started(table: &str, resumed_from: Checkpoint) -> Self {
        Self {
            table: table.to_string(),
            outcome: TableOutcome::Completed,
            final_checkpoint: resumed_from.clone(),
            resumed_from,
            batches: 0,
            rows_scanned: 0,
            rows_updated: 0,
            values_encrypted: 0,
            values_already_encrypted: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == TableOutcome::Completed
    }
}

/// Result of one full pass over every configured table
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when the table configs could not be loaded and nothing ran
    pub config_error: Option<String>,
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn completed(&self) -> usize {
        self.tables.iter().filter(|t| t.is_completed()).count()
    }

    pub fn aborted(&self) -> usize {
        self.tables.len() - self.completed()
    }

    /// No config error and every table completed
    pub fn is_clean(&self) -> bool {
        self.config_error.is_none() && self.aborted() == 0
    }
}
