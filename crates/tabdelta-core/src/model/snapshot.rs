//! Snapshots, owner references and delta descriptors.

use crate::model::types::{SemanticType, StorageType};
use crate::model::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned key of a physical row
pub type RowId = i64;

/// A snapshot column as declared by the producing program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, semantic_type: impl Into<SemanticType>) -> Self {
        Self {
            name: name.into(),
            semantic_type: semantic_type.into(),
        }
    }

    /// Storage type this column resolves to
    pub fn storage_type(&self) -> StorageType {
        self.semantic_type.storage_type()
    }
}

/// A column with its resolved storage type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub storage_type: StorageType,
}

impl Column {
    pub fn new(name: impl Into<String>, storage_type: StorageType) -> Self {
        Self {
            name: name.into(),
            storage_type,
        }
    }
}

/// A full snapshot of a table
///
/// The first column is the logical index. Rows are aligned to `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Value>>,
}

impl Snapshot {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builder-style row append
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn index_column(&self) -> Option<&str> {
        self.columns.first().map(|c| c.name.as_str())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Who produced a snapshot, and where
///
/// Passed explicitly on every save; there is no ambient "current block".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub timestamp: DateTime<Utc>,
    /// Source location or line number of the producing statement
    pub location: String,
    /// Variable name the snapshot was bound to
    pub name: String,
    pub block_id: Option<u32>,
    pub split_id: Option<u32>,
}

impl OwnerRef {
    /// Owner stamped with the current time
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            location: location.into(),
            name: name.into(),
            block_id: None,
            split_id: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_block(mut self, block_id: u32) -> Self {
        self.block_id = Some(block_id);
        self
    }

    pub fn with_split(mut self, split_id: u32) -> Self {
        self.split_id = Some(split_id);
        self
    }
}

/// Per-snapshot record sufficient to rebuild that snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaDescriptor {
    /// UUIDv7
    pub descriptor_id: String,
    pub table: String,
    /// Position in the table's history, starting at 1
    pub seq: u64,
    pub owner: OwnerRef,
    /// One per snapshot row, in snapshot row order
    pub row_ids: Vec<RowId>,
    /// The snapshot's own column list, logical index first
    pub columns: Vec<String>,
    pub created_at_ms: i64,
}

/// A snapshot reconstructed from the row store
#[derive(Debug, Clone, PartialEq)]
pub struct RebuiltSnapshot {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl RebuiltSnapshot {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(pos)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_resolves_dtype_name() {
        let col = ColumnSpec::new("age", "int64");
        assert_eq!(col.storage_type(), StorageType::Integer);
    }

    #[test]
    fn test_owner_builder() {
        let owner = OwnerRef::new("df", "main.py:12")
            .with_block(2)
            .with_split(1);
        assert_eq!(owner.block_id, Some(2));
        assert_eq!(owner.split_id, Some(1));
        assert_eq!(owner.location, "main.py:12");
    }

    #[test]
    fn test_rebuilt_column_values() {
        let rebuilt = RebuiltSnapshot {
            columns: vec![
                Column::new("id", StorageType::Integer),
                Column::new("name", StorageType::Text),
            ],
            rows: vec![
                vec![Value::Int(1), Value::from("Al")],
                vec![Value::Int(2), Value::from("Bo")],
            ],
        };
        let names = rebuilt.column_values("name").unwrap();
        assert_eq!(names, vec![&Value::from("Al"), &Value::from("Bo")]);
        assert!(rebuilt.column_values("grade").is_none());
    }
}
