use crate::model::types::StorageType;
use thiserror::Error;

/// Result type alias using SnapshotError
pub type Result<T> = std::result::Result<T, SnapshotError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by `save`, `rebuild` or `reclaim` is classified
/// into one of these kinds. Each kind maps to a stable code that callers can
/// match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Caller supplied an argument that can never be valid
    InvalidInput,
    /// A column's resolved storage type differs from its registered type
    TypeConflict,
    /// Snapshot shape is unusable, or an additive-schema rule was broken
    Schema,
    /// The backing store failed, or referenced data is missing
    Storage,
    /// A guard against duplicated or overwritten history tripped
    Integrity,
    NotFound,
    Serialization,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::TypeConflict => "ERR_TYPE_CONFLICT",
            ExErrorKind::Schema => "ERR_SCHEMA",
            ExErrorKind::Storage => "ERR_STORAGE",
            ExErrorKind::Integrity => "ERR_INTEGRITY",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus optional
/// context about where the failure happened.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    column: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            column: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add column context
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Add entity ID context (descriptor id, row id, migration id)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {})", column)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors raised while validating and planning a snapshot
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Column already registered with another storage type
    #[error("Column '{column}' is registered as {registered} but the snapshot resolves it to {presented}")]
    TypeConflict {
        column: String,
        registered: StorageType,
        presented: StorageType,
    },

    /// Snapshot has no columns, so no logical index either
    #[error("Snapshot has no columns; the first column must be the logical index")]
    MissingIndexColumn,

    /// The table was first saved with another logical index column
    #[error("Logical index column is '{expected}' for this table but the snapshot starts with '{found}'")]
    IndexColumnMismatch { expected: String, found: String },

    #[error("Column at position {position} has an empty name")]
    EmptyColumnName { position: usize },

    #[error("Column '{column}' appears more than once in the snapshot")]
    DuplicateColumn { column: String },

    /// Row does not line up with the column list
    #[error("Row {row} has {actual} values but the snapshot has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Value cannot be stored in the column's storage type
    #[error("Row {row} holds a value for column '{column}' that cannot be stored as {expected}")]
    IncompatibleValue {
        row: usize,
        column: String,
        expected: StorageType,
    },

    #[error("Row {row} has a null logical index")]
    NullIndex { row: usize },

    #[error("Logical index {key} appears more than once in the snapshot")]
    DuplicateIndex { key: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from SnapshotError to ExError
impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        let message = err.to_string();
        match err {
            SnapshotError::TypeConflict { column, .. } => ExError::new(ExErrorKind::TypeConflict)
                .with_column(column)
                .with_message(message),

            SnapshotError::IncompatibleValue { column, .. }
            | SnapshotError::DuplicateColumn { column } => ExError::new(ExErrorKind::Schema)
                .with_column(column)
                .with_message(message),

            SnapshotError::IndexColumnMismatch { found, .. } => ExError::new(ExErrorKind::Schema)
                .with_column(found)
                .with_message(message),

            SnapshotError::MissingIndexColumn
            | SnapshotError::EmptyColumnName { .. }
            | SnapshotError::RaggedRow { .. }
            | SnapshotError::NullIndex { .. }
            | SnapshotError::DuplicateIndex { .. } => {
                ExError::new(ExErrorKind::Schema).with_message(message)
            }

            SnapshotError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_conflict_maps_to_kind() {
        let err = SnapshotError::TypeConflict {
            column: "age".to_string(),
            registered: StorageType::Double,
            presented: StorageType::Text,
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::TypeConflict);
        assert_eq!(ex.code(), "ERR_TYPE_CONFLICT");
        assert_eq!(ex.column(), Some("age"));
        assert!(ex.message().contains("double precision"));
    }

    #[test]
    fn test_display_includes_context() {
        let ex = ExError::new(ExErrorKind::Storage)
            .with_op("select_many")
            .with_table("students")
            .with_message("row 7 missing");
        let rendered = ex.to_string();
        assert!(rendered.starts_with("[ERR_STORAGE]"));
        assert!(rendered.contains("select_many"));
        assert!(rendered.contains("students"));
    }

    #[test]
    fn test_source_chain_exposed() {
        let inner = ExError::new(ExErrorKind::Storage).with_message("disk I/O error");
        let outer = ExError::new(ExErrorKind::Integrity).with_source(inner);
        let source = std::error::Error::source(&outer).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("[ERR_STORAGE]: disk I/O error"));
    }
}
