//! Column encoding helpers and a sequential row reader.
//!
//! Timestamps are written as RFC 3339 with a fixed nine-digit fraction so
//! that text ordering matches time ordering and nothing is truncated.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Row, Value};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::audit::Audit;
use crate::error::DatabaseError;

// ── Encoding ────────────────────────────────────────────────────────

pub(crate) fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Convert `Option<&str>` to libsql Value.
pub(crate) fn opt_text(s: Option<&str>) -> Value {
    match s {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

pub(crate) fn int(n: impl Into<i64>) -> Value {
    Value::Integer(n.into())
}

pub(crate) fn opt_int(n: Option<i64>) -> Value {
    n.map_or(Value::Null, Value::Integer)
}

/// Integer identity, or NULL so SQLite assigns the next rowid.
pub(crate) fn rowid(id: i64) -> Value {
    if id == 0 { Value::Null } else { Value::Integer(id) }
}

pub(crate) fn flag(b: bool) -> Value {
    Value::Integer(i64::from(b))
}

pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn timestamp(dt: &DateTime<Utc>) -> Value {
    Value::Text(format_timestamp(dt))
}

pub(crate) fn opt_timestamp(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map_or(Value::Null, timestamp)
}

pub(crate) fn uuid(id: &Uuid) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn opt_decimal(d: Option<&Decimal>) -> Value {
    d.map_or(Value::Null, |d| Value::Text(d.to_string()))
}

/// The five audit columns, in table order.
pub(crate) fn audit(audit: &Audit) -> [Value; 5] {
    [
        opt_text(audit.created_by.as_deref()),
        timestamp(&audit.created_at),
        opt_text(audit.modified_by.as_deref()),
        opt_timestamp(audit.modified_at.as_ref()),
        flag(audit.is_deleted),
    ]
}

// ── Decoding ────────────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime() output with fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Reads the columns of one row left to right.
///
/// Joined queries keep reading past the root table's columns into the
/// related table's.
pub(crate) struct RowReader<'r> {
    row: &'r Row,
    next: i32,
}

impl<'r> RowReader<'r> {
    pub(crate) fn new(row: &'r Row) -> Self {
        Self { row, next: 0 }
    }

    fn take(&mut self) -> Result<(i32, Value), DatabaseError> {
        let idx = self.next;
        let value = self
            .row
            .get_value(idx)
            .map_err(|e| DatabaseError::Serialization(format!("column {idx}: {e}")))?;
        self.next += 1;
        Ok((idx, value))
    }

    /// Whether the next column is NULL, without consuming it.
    pub(crate) fn peek_null(&self) -> bool {
        matches!(self.row.get_value(self.next), Ok(Value::Null) | Err(_))
    }

    /// Skip `n` columns.
    pub(crate) fn skip(&mut self, n: usize) {
        self.next += n as i32;
    }

    pub(crate) fn opt_text(&mut self) -> Result<Option<String>, DatabaseError> {
        match self.take()? {
            (_, Value::Null) => Ok(None),
            (_, Value::Text(s)) => Ok(Some(s)),
            (idx, other) => Err(unexpected(idx, "text", &other)),
        }
    }

    pub(crate) fn text(&mut self) -> Result<String, DatabaseError> {
        let idx = self.next;
        self.opt_text()?.ok_or_else(|| null_column(idx))
    }

    pub(crate) fn opt_int(&mut self) -> Result<Option<i64>, DatabaseError> {
        match self.take()? {
            (_, Value::Null) => Ok(None),
            (_, Value::Integer(n)) => Ok(Some(n)),
            (idx, other) => Err(unexpected(idx, "integer", &other)),
        }
    }

    pub(crate) fn int(&mut self) -> Result<i64, DatabaseError> {
        let idx = self.next;
        self.opt_int()?.ok_or_else(|| null_column(idx))
    }

    pub(crate) fn int32(&mut self) -> Result<i32, DatabaseError> {
        let idx = self.next;
        let n = self.int()?;
        i32::try_from(n).map_err(|_| {
            DatabaseError::Serialization(format!("column {idx}: {n} out of range for i32"))
        })
    }

    pub(crate) fn flag(&mut self) -> Result<bool, DatabaseError> {
        Ok(self.int()? != 0)
    }

    pub(crate) fn opt_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let idx = self.next;
        match self.opt_text()? {
            None => Ok(None),
            Some(s) => parse_datetime(&s).map(Some).ok_or_else(|| {
                DatabaseError::Serialization(format!("column {idx}: invalid timestamp {s:?}"))
            }),
        }
    }

    pub(crate) fn timestamp(&mut self) -> Result<DateTime<Utc>, DatabaseError> {
        let idx = self.next;
        self.opt_timestamp()?.ok_or_else(|| null_column(idx))
    }

    pub(crate) fn uuid(&mut self) -> Result<Uuid, DatabaseError> {
        let idx = self.next;
        let s = self.text()?;
        Uuid::parse_str(&s)
            .map_err(|e| DatabaseError::Serialization(format!("column {idx}: {e}")))
    }

    pub(crate) fn opt_decimal(&mut self) -> Result<Option<Decimal>, DatabaseError> {
        let idx = self.next;
        match self.opt_text()? {
            None => Ok(None),
            Some(s) => Decimal::from_str(&s)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(format!("column {idx}: {e}"))),
        }
    }

    /// Read a text column through `FromStr`.
    pub(crate) fn parsed<T>(&mut self) -> Result<T, DatabaseError>
    where
        T: FromStr<Err = String>,
    {
        let idx = self.next;
        let s = self.text()?;
        s.parse()
            .map_err(|e| DatabaseError::Serialization(format!("column {idx}: {e}")))
    }

    pub(crate) fn opt_parsed<T>(&mut self) -> Result<Option<T>, DatabaseError>
    where
        T: FromStr<Err = String>,
    {
        let idx = self.next;
        match self.opt_text()? {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(format!("column {idx}: {e}"))),
        }
    }

    /// Read the five audit columns.
    pub(crate) fn audit(&mut self) -> Result<Audit, DatabaseError> {
        Ok(Audit {
            created_by: self.opt_text()?,
            created_at: self.timestamp()?,
            modified_by: self.opt_text()?,
            modified_at: self.opt_timestamp()?,
            is_deleted: self.flag()?,
        })
    }
}

fn null_column(idx: i32) -> DatabaseError {
    DatabaseError::Serialization(format!("column {idx}: unexpected NULL"))
}

fn unexpected(idx: i32, wanted: &str, got: &Value) -> DatabaseError {
    DatabaseError::Serialization(format!("column {idx}: expected {wanted}, got {got:?}"))
}
