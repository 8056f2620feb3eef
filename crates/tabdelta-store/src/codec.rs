//! Cell encoding between the value model and SQLite
//!
//! | Storage type | SQL declaration | Stored as |
//! |---|---|---|
//! | integer | INTEGER | integer |
//! | double precision, real | REAL | IEEE double |
//! | text | TEXT | UTF-8 text |
//! | boolean | INTEGER | 0 / 1 |
//! | date, time, timestamp | TEXT | ISO-8601 text |
//! | interval | INTEGER | nanoseconds |

#![allow(clippy::result_large_err)]

use crate::errors::{corrupt_cell, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::{Value as SqlValue, ValueRef};
use tabdelta_core::model::value::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use tabdelta_core::model::{RowId, StorageType, Value};

/// Column declaration used for a physical column of this type
pub fn sql_decl(ty: StorageType) -> &'static str {
    match ty {
        StorageType::Integer | StorageType::Boolean | StorageType::Interval => "INTEGER",
        StorageType::Double | StorageType::Real => "REAL",
        StorageType::Text | StorageType::Date | StorageType::Time | StorageType::Timestamp => {
            "TEXT"
        }
    }
}

/// Encode a coerced value for binding
pub fn encode(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Float32(f) => SqlValue::Real(f64::from(*f)),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Date(d) => SqlValue::Text(d.format(DATE_FORMAT).to_string()),
        Value::Time(t) => SqlValue::Text(t.format(TIME_FORMAT).to_string()),
        Value::Timestamp(ts) => SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        Value::TimestampTz(ts) => {
            SqlValue::Text(ts.naive_utc().format(TIMESTAMP_FORMAT).to_string())
        }
        Value::Interval(d) => match d.num_nanoseconds() {
            Some(ns) => SqlValue::Integer(ns),
            None => SqlValue::Null,
        },
    }
}

/// Where a cell came from, for error reporting
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub row_id: RowId,
}

/// Decode a stored cell as `ty`
///
/// ## Errors
///
/// `ExErrorKind::Storage` when the stored value does not fit the column
/// type (the row table was written by something other than this crate).
pub fn decode(cell: CellRef<'_>, raw: ValueRef<'_>, ty: StorageType) -> Result<Value> {
    let bad = |reason: &str| corrupt_cell(cell.table, cell.column, cell.row_id, reason);

    let value = match (ty, raw) {
        (_, ValueRef::Null) => Value::Null,
        (StorageType::Integer, ValueRef::Integer(i)) => Value::Int(i),
        (StorageType::Double, ValueRef::Real(f)) => Value::Float(f),
        (StorageType::Double, ValueRef::Integer(i)) => Value::Float(i as f64),
        (StorageType::Real, ValueRef::Real(f)) => Value::Float32(f as f32),
        (StorageType::Real, ValueRef::Integer(i)) => Value::Float32(i as f32),
        (StorageType::Boolean, ValueRef::Integer(0)) => Value::Bool(false),
        (StorageType::Boolean, ValueRef::Integer(1)) => Value::Bool(true),
        (StorageType::Interval, ValueRef::Integer(ns)) => {
            Value::Interval(Duration::nanoseconds(ns))
        }
        (StorageType::Text, ValueRef::Text(bytes)) => Value::Text(utf8(bytes).map_err(bad)?),
        (StorageType::Date, ValueRef::Text(bytes)) => {
            let s = utf8(bytes).map_err(bad)?;
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| bad(&e.to_string()))?
        }
        (StorageType::Time, ValueRef::Text(bytes)) => {
            let s = utf8(bytes).map_err(bad)?;
            NaiveTime::parse_from_str(&s, TIME_FORMAT)
                .map(Value::Time)
                .map_err(|e| bad(&e.to_string()))?
        }
        (StorageType::Timestamp, ValueRef::Text(bytes)) => {
            let s = utf8(bytes).map_err(bad)?;
            NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
                .map(Value::Timestamp)
                .map_err(|e| bad(&e.to_string()))?
        }
        (ty, other) => {
            return Err(bad(&format!(
                "{:?} cannot be read as {}",
                other.data_type(),
                ty
            )))
        }
    };
    Ok(value)
}

fn utf8(bytes: &[u8]) -> std::result::Result<String, &'static str> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| "invalid UTF-8")
}
