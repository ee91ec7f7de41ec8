// src/checkpoint/store.rs
//! Durable table → checkpoint map
//!
//! One mutex guards the whole map and is held across read-modify-persist.
//! The in-memory map is only swapped after the new file is in place, so it
//! never runs ahead of what is on disk.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::{Checkpoint, KeyValue};
use crate::error::{CoreError, Result};
use crate::util::write_atomic;

type Entries = BTreeMap<String, Checkpoint>;

/// On-disk form of one entry: `{"type":"int64","value":42}`,
/// `{"type":"utf8","value":"k"}` or `{"type":"null_marker"}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StoredCheckpoint {
    NullMarker,
    Int64 { value: i64 },
    Utf8 { value: String },
}

impl StoredCheckpoint {
    fn from_checkpoint(checkpoint: &Checkpoint) -> Option<Self> {
        match checkpoint {
            Checkpoint::Absent => None,
            Checkpoint::NullMarker => Some(StoredCheckpoint::NullMarker),
            Checkpoint::Key(KeyValue::Int64(value)) => {
                Some(StoredCheckpoint::Int64 { value: *value })
            }
            Checkpoint::Key(KeyValue::Utf8(value)) => Some(StoredCheckpoint::Utf8 {
                value: value.clone(),
            }),
        }
    }

    fn into_checkpoint(self) -> Checkpoint {
        match self {
            StoredCheckpoint::NullMarker => Checkpoint::NullMarker,
            StoredCheckpoint::Int64 { value } => Checkpoint::Key(KeyValue::Int64(value)),
            StoredCheckpoint::Utf8 { value } => Checkpoint::Key(KeyValue::Utf8(value)),
        }
    }
}

#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl CheckpointStore {
    /// Load the file at `path`, or create it with an empty map
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            entries: Mutex::new(Entries::new()),
        };

        if store.path.exists() {
            store.load_all()?;
            tracing::info!(
                path = %store.path.display(),
                checkpoints = store.lock().len(),
                "checkpoints loaded"
            );
        } else {
            tracing::warn!(
                path = %store.path.display(),
                "checkpoint file not found, creating empty one"
            );
            if let Some(parent) = store.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            store.persist_all()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current resume point; `Absent` when the table has none
    pub fn get(&self, table: &str) -> Checkpoint {
        self.lock().get(table).cloned().unwrap_or_default()
    }

    /// Durably record `checkpoint` for `table` before returning.
    /// Setting `Absent` is the same as [`clear`](Self::clear).
    pub fn set(&self, table: &str, checkpoint: Checkpoint) -> Result<()> {
        if checkpoint.is_absent() {
            return self.clear(table);
        }
        self.mutate(|entries| {
            entries.insert(table.to_string(), checkpoint);
        })
    }

    /// Durably remove the entry for `table`
    pub fn clear(&self, table: &str) -> Result<()> {
        let mut guard = self.lock();
        if !guard.contains_key(table) {
            return Ok(());
        }
        let mut next = guard.clone();
        next.remove(table);
        self.write(&next)?;
        *guard = next;
        Ok(())
    }

    /// Replace the in-memory map with the file's contents
    pub fn load_all(&self) -> Result<()> {
        let mut guard = self.lock();
        let bytes = std::fs::read(&self.path)?;
        // An empty file is a bootstrap that never got its first write
        let entries = if bytes.iter().all(u8::is_ascii_whitespace) {
            Entries::new()
        } else {
            let stored: BTreeMap<String, StoredCheckpoint> = serde_json::from_slice(&bytes)
                .map_err(|e| {
                    CoreError::Config(format!(
                        "corrupt checkpoint file {}: {e}",
                        self.path.display()
                    ))
                })?;
            stored
                .into_iter()
                .map(|(table, cp)| (table, cp.into_checkpoint()))
                .collect()
        };
        *guard = entries;
        Ok(())
    }

    /// Write the in-memory map out as-is
    pub fn persist_all(&self) -> Result<()> {
        let guard = self.lock();
        self.write(&guard)
    }

    /// Copy of every live checkpoint
    pub fn snapshot(&self) -> BTreeMap<String, Checkpoint> {
        self.lock().clone()
    }

    /// Checkpoints in their on-disk JSON form
    pub fn export_json(&self) -> Result<String> {
        let guard = self.lock();
        Ok(serde_json::to_string_pretty(&Self::to_stored(&guard))?)
    }

    fn mutate<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Entries),
    {
        let mut guard = self.lock();
        let mut next = guard.clone();
        apply(&mut next);
        self.write(&next)?;
        *guard = next;
        tracing::debug!(path = %self.path.display(), "checkpoints saved");
        Ok(())
    }

    fn write(&self, entries: &Entries) -> Result<()> {
        let persist_err = |source: io::Error| CoreError::CheckpointPersist {
            path: self.path.clone(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(&Self::to_stored(entries))
            .map_err(|e| persist_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        write_atomic(&self.path, &bytes).map_err(persist_err)
    }

    fn to_stored(entries: &Entries) -> BTreeMap<&str, StoredCheckpoint> {
        entries
            .iter()
            .filter_map(|(table, cp)| {
                StoredCheckpoint::from_checkpoint(cp).map(|stored| (table.as_str(), stored))
            })
            .collect()
    }

    // The map is only ever replaced wholesale after a successful write, so a
    // poisoned guard still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
