// src/store/query.rs
//! SQL rendering for the range read and the per-row update

use rusqlite::types::Value;

use crate::checkpoint::{Checkpoint, KeyValue};
use crate::config::TableEncryptionConfig;

/// Next-batch read: `SELECT pk, cols… FROM t [WHERE …] ORDER BY pk LIMIT n`
#[derive(Debug, Clone, PartialEq)]
pub struct BatchQuery {
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<String>,
    pub after: Checkpoint,
    pub limit: usize,
}

impl BatchQuery {
    pub fn for_table(config: &TableEncryptionConfig, after: &Checkpoint, limit: usize) -> Self {
        Self {
            table: config.table_name.clone(),
            primary_key: config.primary_key.clone(),
            columns: config.columns_to_encrypt.clone(),
            after: after.clone(),
            limit,
        }
    }

    /// SQL text plus positional parameters
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let pk = quote_ident(&self.primary_key);
        let mut select = vec![pk.clone()];
        select.extend(self.columns.iter().map(|c| quote_ident(c)));

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), quote_ident(&self.table));
        let mut params = Vec::with_capacity(2);

        match &self.after {
            Checkpoint::Absent => {}
            Checkpoint::NullMarker => sql.push_str(&format!(" WHERE {pk} IS NOT NULL")),
            Checkpoint::Key(key) => {
                sql.push_str(&format!(" WHERE {pk} > ?{}", params.len() + 1));
                params.push(match key {
                    KeyValue::Int64(v) => Value::Integer(*v),
                    KeyValue::Utf8(s) => Value::Text(s.clone()),
                });
            }
        }

        sql.push_str(&format!(" ORDER BY {pk} ASC LIMIT ?{}", params.len() + 1));
        params.push(Value::Integer(i64::try_from(self.limit).unwrap_or(i64::MAX)));
        (sql, params)
    }
}

/// `UPDATE t SET c1 = ?1, … WHERE pk = ?n` for the given column subset
pub fn update_sql(table: &str, primary_key: &str, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        assignments.join(", "),
        quote_ident(primary_key),
        columns.len() + 1
    )
}

/// Double-quote each dotted part: `main.users` → `"main"."users"`
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}
