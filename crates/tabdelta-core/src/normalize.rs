//! Row normalization.
//!
//! Two steps run on every cell, both keyed on the column's storage type:
//!
//! 1. [`coerce`] turns an incoming value into the exact representation that
//!    will be written to the row store, or rejects it.
//! 2. [`normalize`] maps a value to a hashable canonical form so logically
//!    equal values compare equal whether they came from the producing program
//!    or were read back from storage.

use crate::model::types::StorageType;
use crate::model::value::{Value, DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Significant digits kept for single-precision floats
pub const REAL_SIGNIFICANT_DIGITS: usize = 6;
/// Significant digits kept for double-precision floats
pub const DOUBLE_SIGNIFICANT_DIGITS: usize = 15;

/// Canonical, hashable form of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedValue {
    Null,
    Integer(i64),
    /// Bit pattern of the rounded float; `-0.0` folded into `0.0`
    Float(u64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Nanoseconds
    Interval(i64),
}

impl NormalizedValue {
    /// Key under which a logical index value is tracked
    ///
    /// The type prefix keeps `1` and `"1"` apart.
    pub fn index_key(&self) -> String {
        match self {
            NormalizedValue::Null => "n:".to_string(),
            NormalizedValue::Integer(i) => format!("i:{}", i),
            NormalizedValue::Float(bits) => format!("f:{:016x}", bits),
            NormalizedValue::Text(s) => format!("t:{}", s),
            NormalizedValue::Boolean(b) => format!("b:{}", u8::from(*b)),
            NormalizedValue::Date(d) => format!("d:{}", d.format(DATE_FORMAT)),
            NormalizedValue::Time(t) => format!("h:{}", t.format(TIME_FORMAT)),
            NormalizedValue::Timestamp(ts) => format!("ts:{}", ts.format(TIMESTAMP_FORMAT)),
            NormalizedValue::Interval(ns) => format!("iv:{}", ns),
        }
    }
}

/// Convert a value into the representation stored for `ty`
///
/// Returns `None` when the value cannot be stored in that type. NaN in a
/// float column is treated as missing and becomes `Null`; any non-null value
/// is accepted by a text column through its canonical rendering.
pub fn coerce(value: &Value, ty: StorageType) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    match ty {
        StorageType::Integer => match value {
            Value::Int(i) => Some(Value::Int(*i)),
            _ => None,
        },
        StorageType::Double => match value {
            Value::Float(f) => Some(float_or_null(*f)),
            Value::Float32(f) => Some(float_or_null(f64::from(*f))),
            Value::Int(i) => Some(Value::Float(*i as f64)),
            _ => None,
        },
        StorageType::Real => match value {
            Value::Float32(f) if f.is_nan() => Some(Value::Null),
            Value::Float32(f) => Some(Value::Float32(*f)),
            Value::Float(f) if f.is_nan() => Some(Value::Null),
            Value::Float(f) => Some(Value::Float32(*f as f32)),
            Value::Int(i) => Some(Value::Float32(*i as f32)),
            _ => None,
        },
        StorageType::Text => value.render_text().map(Value::Text),
        StorageType::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            _ => None,
        },
        StorageType::Date => match value {
            Value::Date(d) => Some(Value::Date(*d)),
            _ => None,
        },
        StorageType::Time => match value {
            Value::Time(t) => Some(Value::Time(*t)),
            _ => None,
        },
        StorageType::Timestamp => match value {
            Value::Timestamp(ts) => Some(Value::Timestamp(*ts)),
            Value::TimestampTz(ts) => Some(Value::Timestamp(ts.naive_utc())),
            _ => None,
        },
        StorageType::Interval => match value {
            Value::Interval(d) if d.num_nanoseconds().is_some() => Some(Value::Interval(*d)),
            _ => None,
        },
    }
}

fn float_or_null(f: f64) -> Value {
    if f.is_nan() {
        Value::Null
    } else {
        Value::Float(f)
    }
}

/// Canonical form of `value` under storage type `ty`
pub fn normalize(value: &Value, ty: StorageType) -> NormalizedValue {
    match (ty, value) {
        (_, Value::Null) => NormalizedValue::Null,
        (StorageType::Real, v) => match as_f64(v) {
            Some(f) => float_bits(round_significant(f, REAL_SIGNIFICANT_DIGITS)),
            None => exact(v),
        },
        (StorageType::Double, v) => match as_f64(v) {
            Some(f) => float_bits(round_significant(f, DOUBLE_SIGNIFICANT_DIGITS)),
            None => exact(v),
        },
        (StorageType::Timestamp, Value::TimestampTz(ts)) => {
            NormalizedValue::Timestamp(ts.naive_utc())
        }
        (StorageType::Text, v) => {
            NormalizedValue::Text(v.render_text().unwrap_or_default())
        }
        (_, v) => exact(v),
    }
}

/// Normalize a whole tuple against its column types
pub fn normalize_row(values: &[Value], types: &[StorageType]) -> Vec<NormalizedValue> {
    values
        .iter()
        .zip(types)
        .map(|(v, ty)| normalize(v, *ty))
        .collect()
}

fn exact(value: &Value) -> NormalizedValue {
    match value {
        Value::Null => NormalizedValue::Null,
        Value::Bool(b) => NormalizedValue::Boolean(*b),
        Value::Int(i) => NormalizedValue::Integer(*i),
        Value::Float(f) => float_bits(*f),
        Value::Float32(f) => float_bits(f64::from(*f)),
        Value::Text(s) => NormalizedValue::Text(s.clone()),
        Value::Date(d) => NormalizedValue::Date(*d),
        Value::Time(t) => NormalizedValue::Time(*t),
        Value::Timestamp(ts) => NormalizedValue::Timestamp(*ts),
        Value::TimestampTz(ts) => NormalizedValue::Timestamp(ts.naive_utc()),
        Value::Interval(d) => NormalizedValue::Interval(d.num_nanoseconds().unwrap_or(i64::MAX)),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Float32(f) => Some(f64::from(*f)),
        Value::Int(i) => Some(*i as f64),
        _ => None,
    }
}

fn float_bits(f: f64) -> NormalizedValue {
    let canonical = if f == 0.0 {
        0.0
    } else if f.is_nan() {
        f64::NAN
    } else {
        f
    };
    NormalizedValue::Float(canonical.to_bits())
}

/// Round to `digits` significant decimal digits
pub fn round_significant(f: f64, digits: usize) -> f64 {
    if !f.is_finite() || f == 0.0 || digits == 0 {
        return f;
    }
    format!("{:.*e}", digits - 1, f).parse().unwrap_or(f)
}
