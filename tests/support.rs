// tests/support.rs
//! Test fixtures: a throwaway database + checkpoint file + table config,
//! and a row store wrapper that fails on demand.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::sync::Arc;

use encrypted_column_sweep::store::{Batch, BatchQuery, ChangeSet};
use encrypted_column_sweep::{
    Checkpoint, CheckpointStore, ColumnCipher, CoreError, CoreResult, Pipeline, PipelineOptions,
    RowStore, SqliteRowStore, TableConfigSource, TableConfigs, TableEncryptionConfig,
};
use rusqlite::{params, Connection};
use tempfile::TempDir;

/// 32 bytes → AES-256
#[allow(dead_code)]
pub const TEST_KEY: &str = "test-column-key-0123456789abcdef";
#[allow(dead_code)]
pub const TEST_IV: &str = "test-iv-00000000";

#[allow(dead_code)]
pub fn test_cipher() -> ColumnCipher {
    ColumnCipher::from_secrets(TEST_KEY, TEST_IV).expect("test key + iv")
}

#[allow(dead_code)]
pub fn options(batch_size: usize) -> PipelineOptions {
    PipelineOptions {
        batch_size,
        ..PipelineOptions::default()
    }
}

#[allow(dead_code)]
pub fn users_config() -> TableEncryptionConfig {
    TableEncryptionConfig::new("users", "user_id", ["email"])
}

/// Everything a run touches, rooted in one temp dir.
///
/// Each call to [`Sandbox::pipeline`] opens the database and checkpoint file
/// afresh, the same way a restarted process would.
#[allow(dead_code)]
pub struct Sandbox {
    dir: TempDir,
    pub db_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub table_config_path: PathBuf,
}

#[allow(dead_code)]
impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("app.db");
        let checkpoint_path = dir.path().join("state").join("checkpoints.json");
        let table_config_path = dir.path().join("tables.json");
        Self {
            dir,
            db_path,
            checkpoint_path,
            table_config_path,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn conn(&self) -> Connection {
        Connection::open(&self.db_path).expect("open test db")
    }

    /// `users(user_id INTEGER PRIMARY KEY, email TEXT, phone TEXT)`
    pub fn create_users(&self, rows: &[(i64, Option<&str>)]) {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE users (user_id INTEGER PRIMARY KEY, email TEXT, phone TEXT)",
        )
        .expect("create users");
        for (id, email) in rows {
            conn.execute(
                "INSERT INTO users (user_id, email, phone) VALUES (?1, ?2, NULL)",
                params![id, email],
            )
            .expect("insert user");
        }
    }

    pub fn write_tables<I>(&self, configs: I)
    where
        I: IntoIterator<Item = TableEncryptionConfig>,
    {
        let configs: TableConfigs = configs.into_iter().collect();
        self.table_source().save(&configs).expect("save table config");
    }

    pub fn table_source(&self) -> TableConfigSource {
        TableConfigSource::new(&self.table_config_path)
    }

    pub fn row_store(&self) -> SqliteRowStore {
        SqliteRowStore::open(&self.db_path, None).expect("open row store")
    }

    pub fn checkpoints(&self) -> Arc<CheckpointStore> {
        Arc::new(CheckpointStore::open(&self.checkpoint_path).expect("open checkpoints"))
    }

    pub fn pipeline(&self, options: PipelineOptions) -> Pipeline<SqliteRowStore> {
        self.pipeline_with(self.row_store(), options)
    }

    pub fn pipeline_with<S: RowStore>(&self, store: S, options: PipelineOptions) -> Pipeline<S> {
        Pipeline::new(
            store,
            self.checkpoints(),
            test_cipher(),
            self.table_source(),
            options,
        )
    }

    /// Current checkpoint as a freshly started process would see it
    pub fn checkpoint(&self, table: &str) -> Checkpoint {
        self.checkpoints().get(table)
    }

    /// `(key, value)` pairs of one integer-keyed column, in key order
    pub fn column(
        &self,
        table: &str,
        primary_key: &str,
        column: &str,
    ) -> Vec<(i64, Option<String>)> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {primary_key}, {column} FROM {table} ORDER BY {primary_key}"
            ))
            .expect("prepare column read");
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("read column")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("collect column")
    }

    pub fn emails(&self) -> Vec<(i64, Option<String>)> {
        self.column("users", "user_id", "email")
    }
}

/// Wraps a real store and injects failures by call number (1-based).
/// Every query it sees is recorded.
#[allow(dead_code)]
pub struct FlakyStore<S> {
    inner: S,
    fail_fetch_from: Option<usize>,
    fail_apply_on: Option<usize>,
    rewind_on: Option<usize>,
    fetches: Cell<usize>,
    applies: usize,
    queries: RefCell<Vec<BatchQuery>>,
}

#[allow(dead_code)]
impl<S: RowStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_fetch_from: None,
            fail_apply_on: None,
            rewind_on: None,
            fetches: Cell::new(0),
            applies: 0,
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Fetch number `n` and every later one fails
    pub fn fail_fetch_from(mut self, n: usize) -> Self {
        self.fail_fetch_from = Some(n);
        self
    }

    /// Only update call number `n` fails
    pub fn fail_apply_on(mut self, n: usize) -> Self {
        self.fail_apply_on = Some(n);
        self
    }

    /// Fetch number `n` ignores the cursor and reads from the start
    pub fn rewind_on(mut self, n: usize) -> Self {
        self.rewind_on = Some(n);
        self
    }

    pub fn cursors(&self) -> Vec<Checkpoint> {
        self.queries.borrow().iter().map(|q| q.after.clone()).collect()
    }
}

impl<S: RowStore> RowStore for FlakyStore<S> {
    fn fetch_batch(&self, query: &BatchQuery) -> CoreResult<Batch> {
        let n = self.fetches.get() + 1;
        self.fetches.set(n);
        self.queries.borrow_mut().push(query.clone());

        if self.fail_fetch_from.is_some_and(|from| n >= from) {
            return Err(CoreError::Store(rusqlite::Error::InvalidQuery));
        }
        if self.rewind_on == Some(n) {
            let mut rewound = query.clone();
            rewound.after = Checkpoint::Absent;
            return self.inner.fetch_batch(&rewound);
        }
        self.inner.fetch_batch(query)
    }

    fn apply_changes(
        &mut self,
        table: &TableEncryptionConfig,
        changes: &ChangeSet,
    ) -> CoreResult<usize> {
        self.applies += 1;
        if self.fail_apply_on == Some(self.applies) {
            return Err(CoreError::Store(rusqlite::Error::ExecuteReturnedResults));
        }
        self.inner.apply_changes(table, changes)
    }
}
