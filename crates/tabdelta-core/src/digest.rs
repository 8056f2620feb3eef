//! Digest computation for rows and owner references.
//!
//! ## Digest Types
//!
//! - **Row digest**: SHA256 over a normalized tuple. Each cell is written as
//!   a one-byte tag followed by a fixed-width or length-prefixed payload, so
//!   `("ab", "c")` and `("a", "bc")` never collide by concatenation.
//! - **Owner digest**: SHA256 of the table name plus the canonical JSON of an
//!   owner reference. Identifies "the same snapshot" for the duplicate-append
//!   guard in the version log.

use crate::errors::Result;
use crate::model::snapshot::OwnerRef;
use crate::model::value::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use crate::normalize::NormalizedValue;
use sha2::{Digest, Sha256};

/// Compute the content digest of a normalized row
///
/// Order-sensitive. Returns hex-encoded SHA256 (64 characters).
pub fn row_digest(values: &[NormalizedValue]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        write_value(&mut hasher, value);
    }
    hex::encode(hasher.finalize())
}

fn write_value(hasher: &mut Sha256, value: &NormalizedValue) {
    match value {
        NormalizedValue::Null => hasher.update([0u8]),
        NormalizedValue::Integer(i) => {
            hasher.update([1u8]);
            hasher.update(i.to_le_bytes());
        }
        NormalizedValue::Float(bits) => {
            hasher.update([2u8]);
            hasher.update(bits.to_le_bytes());
        }
        NormalizedValue::Text(s) => {
            hasher.update([3u8]);
            write_str(hasher, s);
        }
        NormalizedValue::Boolean(b) => hasher.update([4u8, u8::from(*b)]),
        NormalizedValue::Date(d) => {
            hasher.update([5u8]);
            write_str(hasher, &d.format(DATE_FORMAT).to_string());
        }
        NormalizedValue::Time(t) => {
            hasher.update([6u8]);
            write_str(hasher, &t.format(TIME_FORMAT).to_string());
        }
        NormalizedValue::Timestamp(ts) => {
            hasher.update([7u8]);
            write_str(hasher, &ts.format(TIMESTAMP_FORMAT).to_string());
        }
        NormalizedValue::Interval(ns) => {
            hasher.update([8u8]);
            hasher.update(ns.to_le_bytes());
        }
    }
}

fn write_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Compute the owner digest for a descriptor about to be appended
///
/// ## Errors
///
/// Returns `SnapshotError::Serialization` if JSON serialization fails.
pub fn owner_digest(table: &str, owner: &OwnerRef) -> Result<String> {
    let canonical = serde_json::to_string(&(table, owner))?;
    Ok(hash_string(&canonical))
}

fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}
