// src/store/sqlite.rs
use std::path::Path;

use rusqlite::types::{ToSql, Value};
use rusqlite::{params_from_iter, Connection};

use super::query::{update_sql, BatchQuery};
use super::{Batch, ChangeSet, Row, RowStore};
use crate::checkpoint::KeyValue;
use crate::config::TableEncryptionConfig;
use crate::error::{CoreError, Result};

/// SQLite (or SQLCipher, when a database key is given) row store
pub struct SqliteRowStore {
    conn: Connection,
}

impl SqliteRowStore {
    pub fn open(path: &Path, database_key: Option<&str>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        if let Some(key) = database_key {
            conn.execute_batch(&format!("PRAGMA key = '{}';", key.replace('\'', "''")))?;
        }
        // Touch the schema so a wrong SQLCipher key fails here, not mid-run
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RowStore for SqliteRowStore {
    fn fetch_batch(&self, query: &BatchQuery) -> Result<Batch> {
        let (sql, params) = query.to_sql();
        let width = query.columns.len() + 1;

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(raw.len());
        for values in raw {
            let mut values = values.into_iter();
            let key_value = values.next().unwrap_or(Value::Null);
            let key =
                KeyValue::from_sql_value(&key_value).map_err(|kind| CoreError::UnsupportedKey {
                    table: query.table.clone(),
                    column: query.primary_key.clone(),
                    kind,
                })?;
            rows.push(Row {
                key,
                values: query.columns.iter().cloned().zip(values).collect(),
            });
        }
        Ok(Batch::new(rows))
    }

    fn apply_changes(
        &mut self,
        table: &TableEncryptionConfig,
        changes: &ChangeSet,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut updated = 0;

        for change in changes.iter() {
            let columns: Vec<&str> = change.assignments.iter().map(|(c, _)| c.as_str()).collect();
            let sql = update_sql(&table.table_name, &table.primary_key, &columns);

            let mut params: Vec<&dyn ToSql> = change
                .assignments
                .iter()
                .map(|(_, v)| v as &dyn ToSql)
                .collect();
            params.push(&change.key);

            let n = tx.prepare_cached(&sql)?.execute(params_from_iter(params))?;
            if n == 0 {
                tracing::warn!(
                    table = %table.table_name,
                    key = %change.key,
                    "row vanished before its update"
                );
            }
            updated += n;
        }

        tx.commit()?;
        Ok(updated)
    }
}
