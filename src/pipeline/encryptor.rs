// src/pipeline/encryptor.rs
//! Pure batch transform: fetched rows → staged ciphertext
//!
//! No I/O and no shared state, so a batch can be re-encrypted any number of
//! times with the same result.

use std::borrow::Cow;

use crate::config::TableEncryptionConfig;
use crate::crypto::ColumnCipher;
use crate::error::CryptoError;
use crate::store::{Batch, ChangeSet, RowChange, Value};

pub struct BatchEncryptor<'a> {
    cipher: &'a ColumnCipher,
}

impl<'a> BatchEncryptor<'a> {
    pub fn new(cipher: &'a ColumnCipher) -> Self {
        Self { cipher }
    }

    /// Stage ciphertext for every non-empty, not-yet-encrypted target value.
    ///
    /// Rows with a NULL key cannot be addressed by the update and are left
    /// alone; rows with nothing to stage do not appear in the result. Values
    /// that are already ciphertext are counted, not staged.
    pub fn apply(
        &self,
        config: &TableEncryptionConfig,
        batch: &Batch,
    ) -> Result<ChangeSet, CryptoError> {
        let mut changes = ChangeSet::default();

        for row in batch.rows() {
            let Some(key) = row.key.as_ref() else {
                continue;
            };

            let mut assignments = Vec::new();
            for column in &config.columns_to_encrypt {
                let Some(text) = row.get(column).and_then(column_text) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                if self.cipher.is_ciphertext(&text) {
                    changes.note_already_encrypted();
                    continue;
                }
                assignments.push((column.clone(), self.cipher.encrypt(&text)?));
            }

            if !assignments.is_empty() {
                changes.push(RowChange {
                    key: key.clone(),
                    assignments,
                });
            }
        }

        Ok(changes)
    }
}

/// Text rendering of a column value; `None` for NULL and non-UTF-8 blobs
fn column_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::Integer(v) => Some(Cow::Owned(v.to_string())),
        // `{:?}` keeps the decimal point: 1.0 → "1.0", not "1"
        Value::Real(v) => Some(Cow::Owned(format!("{v:?}"))),
        Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Blob(b) => std::str::from_utf8(b).ok().map(Cow::Borrowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::KeyValue;
    use crate::store::Row;

    fn cipher() -> ColumnCipher {
        ColumnCipher::from_secrets("0123456789abcdef0123456789abcdef", "fedcba9876543210").unwrap()
    }

    fn row(key: Option<i64>, cols: &[(&str, Value)]) -> Row {
        Row {
            key: key.map(KeyValue::Int64),
            values: cols
                .iter()
                .map(|(c, v)| (c.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn skips_null_empty_and_keyless_rows() {
        let cipher = cipher();
        let config = TableEncryptionConfig::new("users", "user_id", ["email", "phone"]);
        let batch = Batch::new(vec![
            row(Some(1), &[("email", Value::Text("a@x".into())), ("phone", Value::Null)]),
            row(Some(2), &[("email", Value::Text(String::new())), ("phone", Value::Null)]),
            row(None, &[("email", Value::Text("nokey@x".into())), ("phone", Value::Null)]),
        ]);

        let changes = BatchEncryptor::new(&cipher).apply(&config, &batch).unwrap();
        assert_eq!(changes.len(), 1);

        let only = changes.iter().next().unwrap();
        assert_eq!(only.key, KeyValue::Int64(1));
        assert_eq!(only.assignments.len(), 1);
        assert_eq!(only.assignments[0].0, "email");
        assert_eq!(cipher.decrypt(&only.assignments[0].1).unwrap(), "a@x");
    }

    #[test]
    fn already_encrypted_values_are_left_alone() {
        let cipher = cipher();
        let config = TableEncryptionConfig::new("users", "user_id", ["email"]);
        let sealed = cipher.encrypt("a@x").unwrap();
        let batch = Batch::new(vec![row(Some(1), &[("email", Value::Text(sealed))])]);

        let changes = BatchEncryptor::new(&cipher).apply(&config, &batch).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn numbers_are_encrypted_as_text() {
        let cipher = cipher();
        let config = TableEncryptionConfig::new("orders", "order_id", ["credit_card"]);
        let batch = Batch::new(vec![row(
            Some(7),
            &[("credit_card", Value::Integer(4111111111111111))],
        )]);

        let changes = BatchEncryptor::new(&cipher).apply(&config, &batch).unwrap();
        let staged = &changes.iter().next().unwrap().assignments[0].1;
        assert_eq!(cipher.decrypt(staged).unwrap(), "4111111111111111");
    }

    #[test]
    fn counts_values_that_are_already_ciphertext() {
        let cipher = cipher();
        let config = TableEncryptionConfig::new("users", "user_id", ["email", "phone"]);
        let sealed = cipher.encrypt("a@x").unwrap();
        let batch = Batch::new(vec![
            row(Some(1), &[("email", Value::Text(sealed)), ("phone", Value::Null)]),
            row(Some(2), &[("email", Value::Text(String::new())), ("phone", Value::Null)]),
        ]);

        let changes = BatchEncryptor::new(&cipher).apply(&config, &batch).unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.already_encrypted(), 1);
        assert!(changes.is_replay());
    }

    #[test]
    fn null_and_empty_values_are_not_a_replay() {
        let cipher = cipher();
        let config = TableEncryptionConfig::new("users", "user_id", ["email"]);
        let batch = Batch::new(vec![
            row(Some(1), &[("email", Value::Null)]),
            row(Some(2), &[("email", Value::Text(String::new()))]),
        ]);

        let changes = BatchEncryptor::new(&cipher).apply(&config, &batch).unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.already_encrypted(), 0);
        assert!(!changes.is_replay());
    }

    #[test]
    fn real_values_keep_their_decimal_point() {
        let cipher = cipher();
        let config = TableEncryptionConfig::new("readings", "id", ["value"]);
        let batch = Batch::new(vec![
            row(Some(1), &[("value", Value::Real(1.0))]),
            row(Some(2), &[("value", Value::Real(2.5))]),
        ]);

        let changes = BatchEncryptor::new(&cipher).apply(&config, &batch).unwrap();
        let plain: Vec<String> = changes
            .iter()
            .map(|c| cipher.decrypt(&c.assignments[0].1).unwrap())
            .collect();
        assert_eq!(plain, vec!["1.0", "2.5"]);
    }
}
