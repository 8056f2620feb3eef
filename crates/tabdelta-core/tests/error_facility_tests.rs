use tabdelta_core::errors::{ExError, ExErrorKind, SnapshotError};
use tabdelta_core::model::StorageType;

#[test]
fn test_type_conflict_verifiable_by_kind() {
    let err = SnapshotError::TypeConflict {
        column: "age".to_string(),
        registered: StorageType::Double,
        presented: StorageType::Text,
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::TypeConflict);
    assert_eq!(ex_err.code(), "ERR_TYPE_CONFLICT");
    assert_eq!(ex_err.column(), Some("age"));
}

#[test]
fn test_shape_errors_are_schema_errors() {
    let errors = vec![
        SnapshotError::MissingIndexColumn,
        SnapshotError::EmptyColumnName { position: 0 },
        SnapshotError::DuplicateColumn {
            column: "id".to_string(),
        },
        SnapshotError::RaggedRow {
            row: 0,
            expected: 2,
            actual: 1,
        },
        SnapshotError::IncompatibleValue {
            row: 0,
            column: "age".to_string(),
            expected: StorageType::Integer,
        },
        SnapshotError::NullIndex { row: 0 },
        SnapshotError::DuplicateIndex {
            key: "i:1".to_string(),
        },
        SnapshotError::IndexColumnMismatch {
            expected: "id".to_string(),
            found: "name".to_string(),
        },
    ];

    for err in errors {
        let ex_err: ExError = err.into();
        assert_eq!(ex_err.kind(), ExErrorKind::Schema);
        assert_eq!(ex_err.code(), "ERR_SCHEMA");
    }
}

#[test]
fn test_incompatible_value_names_column() {
    let ex_err: ExError = SnapshotError::IncompatibleValue {
        row: 3,
        column: "born".to_string(),
        expected: StorageType::Date,
    }
    .into();

    assert_eq!(ex_err.column(), Some("born"));
    assert!(ex_err.message().contains("date"));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
        (ExErrorKind::TypeConflict, "ERR_TYPE_CONFLICT"),
        (ExErrorKind::Schema, "ERR_SCHEMA"),
        (ExErrorKind::Storage, "ERR_STORAGE"),
        (ExErrorKind::Integrity, "ERR_INTEGRITY"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_builder_context_round_trips() {
    let err = ExError::new(ExErrorKind::NotFound)
        .with_op("rebuild_by_id")
        .with_table("students")
        .with_entity_id("0190-abc")
        .with_message("descriptor not found");

    assert_eq!(err.op(), Some("rebuild_by_id"));
    assert_eq!(err.table(), Some("students"));
    assert_eq!(err.entity_id(), Some("0190-abc"));
    assert_eq!(err.message(), "descriptor not found");
    assert!(err.to_string().contains("[ERR_NOT_FOUND]"));
}
