//! Error handling for tabdelta-store
//!
//! Wraps tabdelta-core ExError with store-specific helpers

use tabdelta_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Integrity)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Database error tagged with the operation and table it happened in
pub fn storage_error(op: &str, table: &str, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op(op)
        .with_table(table)
        .with_message(err.to_string())
}

/// A cell read back from a row table cannot be decoded as its column type
pub fn corrupt_cell(table: &str, column: &str, row_id: i64, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op("decode_cell")
        .with_table(table)
        .with_column(column)
        .with_entity_id(row_id.to_string())
        .with_message(format!("Corrupt cell: {}", reason))
}

/// Create a JSON (de)serialization error
pub fn serialization_error(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op)
        .with_message(err.to_string())
}
