// src/checkpoint/mod.rs
//! Resume positions for the per-table encryption scan

mod store;

use std::fmt;

use rusqlite::types::{ToSql, ToSqlOutput, Value};

pub use store::CheckpointStore;

/// A primary-key value usable as a scan cursor.
///
/// Integers order before text, the same way SQLite orders mixed columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Int64(i64),
    Utf8(String),
}

impl KeyValue {
    /// Map a fetched SQL value to a cursor key. `Ok(None)` for NULL;
    /// `Err` names the SQL type when it has no usable total order.
    pub fn from_sql_value(value: &Value) -> Result<Option<KeyValue>, &'static str> {
        match value {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(KeyValue::Int64(*v))),
            Value::Text(s) => Ok(Some(KeyValue::Utf8(s.clone()))),
            Value::Real(_) => Err("REAL"),
            Value::Blob(_) => Err("BLOB"),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int64(v) => write!(f, "{v}"),
            KeyValue::Utf8(s) => write!(f, "{s:?}"),
        }
    }
}

impl ToSql for KeyValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            KeyValue::Int64(v) => ToSqlOutput::from(*v),
            KeyValue::Utf8(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int64(v)
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::Utf8(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        KeyValue::Utf8(s)
    }
}

/// Where a table's scan resumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Checkpoint {
    /// Never started, or finished: scan from the start of the table
    #[default]
    Absent,
    /// Last processed row had a NULL key; resume among non-NULL keys only
    NullMarker,
    /// Exclusive lower bound for the next fetch
    Key(KeyValue),
}

impl Checkpoint {
    pub fn is_absent(&self) -> bool {
        matches!(self, Checkpoint::Absent)
    }

    /// Cursor position after a batch whose last row carried `key`
    pub fn after_row(key: Option<&KeyValue>) -> Checkpoint {
        match key {
            Some(k) => Checkpoint::Key(k.clone()),
            None => Checkpoint::NullMarker,
        }
    }

    /// Whether moving from `self` to `next` is strictly forward.
    ///
    /// NULL keys sort first, so the null-marker sits after `Absent` and
    /// before every concrete key.
    pub fn advances_to(&self, next: &Checkpoint) -> bool {
        match (self, next) {
            (_, Checkpoint::Absent) => false,
            (Checkpoint::Absent, _) => true,
            (Checkpoint::NullMarker, Checkpoint::Key(_)) => true,
            (Checkpoint::NullMarker, Checkpoint::NullMarker) => false,
            (Checkpoint::Key(_), Checkpoint::NullMarker) => false,
            (Checkpoint::Key(prev), Checkpoint::Key(next)) => next > prev,
        }
    }
}

impl From<KeyValue> for Checkpoint {
    fn from(key: KeyValue) -> Self {
        Checkpoint::Key(key)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Absent => f.write_str("<start>"),
            Checkpoint::NullMarker => f.write_str("<null-marker>"),
            Checkpoint::Key(k) => write!(f, "{k}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_sort_before_text() {
        assert!(KeyValue::Int64(i64::MAX) < KeyValue::Utf8(String::new()));
        assert!(KeyValue::from("a") < KeyValue::from("b"));
    }

    #[test]
    fn advances_only_forward() {
        let two = Checkpoint::from(KeyValue::Int64(2));
        let three = Checkpoint::from(KeyValue::Int64(3));

        assert!(Checkpoint::Absent.advances_to(&Checkpoint::NullMarker));
        assert!(Checkpoint::Absent.advances_to(&two));
        assert!(Checkpoint::NullMarker.advances_to(&two));
        assert!(two.advances_to(&three));

        assert!(!three.advances_to(&two));
        assert!(!two.advances_to(&two));
        assert!(!two.advances_to(&Checkpoint::NullMarker));
        assert!(!Checkpoint::NullMarker.advances_to(&Checkpoint::NullMarker));
        assert!(!two.advances_to(&Checkpoint::Absent));
    }

    #[test]
    fn real_and_blob_keys_are_rejected() {
        assert_eq!(KeyValue::from_sql_value(&Value::Real(1.5)), Err("REAL"));
        assert_eq!(KeyValue::from_sql_value(&Value::Blob(vec![1])), Err("BLOB"));
        assert_eq!(KeyValue::from_sql_value(&Value::Null), Ok(None));
    }
}
