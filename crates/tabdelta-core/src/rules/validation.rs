//! Snapshot validation.
//!
//! Resolves every column's storage type once, coerces every cell, and checks
//! the snapshot against the table's registered schema. Nothing here touches
//! storage, so a snapshot rejected at this stage can never cause a mutation.

use crate::errors::{Result, SnapshotError};
use crate::model::snapshot::{Column, Snapshot};
use crate::model::types::StorageType;
use crate::model::value::Value;
use crate::normalize::{coerce, normalize};
use std::collections::HashSet;

/// A snapshot whose columns are typed and whose cells are coerced
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSnapshot {
    /// Non-empty; the first column is the logical index
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
    /// Identity key of each row's logical index, in row order
    pub index_keys: Vec<String>,
}

impl ResolvedSnapshot {
    pub fn index_column(&self) -> &str {
        &self.columns[0].name
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn types_at(&self, positions: &[usize]) -> Vec<StorageType> {
        positions
            .iter()
            .map(|&p| self.columns[p].storage_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Positions of snapshot columns already registered vs. still to be added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSplit {
    pub shared: Vec<usize>,
    pub new: Vec<usize>,
}

/// Validate a snapshot in isolation and resolve it
///
/// ## Errors
///
/// - `MissingIndexColumn`: no columns at all
/// - `EmptyColumnName` / `DuplicateColumn`: unusable column list
/// - `RaggedRow`: a row does not match the column count
/// - `IncompatibleValue`: a cell cannot be stored in its column's type
/// - `NullIndex` / `DuplicateIndex`: logical index is missing or repeated
pub fn resolve_snapshot(snapshot: &Snapshot) -> Result<ResolvedSnapshot> {
    if snapshot.columns.is_empty() {
        return Err(SnapshotError::MissingIndexColumn);
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(snapshot.columns.len());
    for (position, spec) in snapshot.columns.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(SnapshotError::EmptyColumnName { position });
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(SnapshotError::DuplicateColumn {
                column: spec.name.clone(),
            });
        }
        columns.push(Column::new(spec.name.clone(), spec.storage_type()));
    }

    let index_type = columns[0].storage_type;
    let mut rows = Vec::with_capacity(snapshot.rows.len());
    let mut index_keys = Vec::with_capacity(snapshot.rows.len());
    let mut seen_keys = HashSet::new();

    for (row_no, row) in snapshot.rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(SnapshotError::RaggedRow {
                row: row_no,
                expected: columns.len(),
                actual: row.len(),
            });
        }

        let coerced = row
            .iter()
            .zip(&columns)
            .map(|(value, column)| {
                coerce(value, column.storage_type).ok_or_else(|| {
                    SnapshotError::IncompatibleValue {
                        row: row_no,
                        column: column.name.clone(),
                        expected: column.storage_type,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if coerced[0].is_null() {
            return Err(SnapshotError::NullIndex { row: row_no });
        }
        let key = normalize(&coerced[0], index_type).index_key();
        if !seen_keys.insert(key.clone()) {
            return Err(SnapshotError::DuplicateIndex { key });
        }

        index_keys.push(key);
        rows.push(coerced);
    }

    Ok(ResolvedSnapshot {
        columns,
        rows,
        index_keys,
    })
}

/// Check a resolved snapshot against the registered schema and split its
/// columns into shared and new
///
/// `index_column` is the logical index recorded for the table, if any.
///
/// ## Errors
///
/// - `IndexColumnMismatch`: the snapshot leads with another index column
/// - `TypeConflict`: a shared column resolves to a different storage type
pub fn split_columns(
    resolved: &ResolvedSnapshot,
    registered: &[Column],
    index_column: Option<&str>,
) -> Result<ColumnSplit> {
    if let Some(expected) = index_column {
        if expected != resolved.index_column() {
            return Err(SnapshotError::IndexColumnMismatch {
                expected: expected.to_string(),
                found: resolved.index_column().to_string(),
            });
        }
    }

    let mut split = ColumnSplit::default();
    for (position, column) in resolved.columns.iter().enumerate() {
        match registered.iter().find(|r| r.name == column.name) {
            Some(existing) if existing.storage_type != column.storage_type => {
                return Err(SnapshotError::TypeConflict {
                    column: column.name.clone(),
                    registered: existing.storage_type,
                    presented: column.storage_type,
                });
            }
            Some(_) => split.shared.push(position),
            None => split.new.push(position),
        }
    }
    Ok(split)
}
