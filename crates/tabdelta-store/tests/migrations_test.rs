// Integration tests for the migration framework

use rusqlite::Connection;
use tabdelta_core::errors::ExErrorKind;
use tabdelta_store::migrations::{applied_migrations, apply_migrations};

mod common;

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let (_dir, conn) = common::setup_test_db();

    let tables = get_table_names(&conn);
    for expected in [
        "schema_version",
        "tracked_tables",
        "table_columns",
        "identity_index",
        "delta_log",
        "sqlite_sequence", // Auto-created by SQLite for AUTOINCREMENT columns
    ] {
        assert!(
            tables.contains(&expected.to_string()),
            "Missing table: {}",
            expected
        );
    }
}

#[test]
fn test_migrations_are_idempotent() {
    let (_dir, mut conn) = common::setup_test_db();
    let before = applied_migrations(&conn).unwrap();

    apply_migrations(&mut conn).unwrap();

    assert_eq!(applied_migrations(&conn).unwrap(), before);
}

#[test]
fn test_checksum_drift_rejected() {
    let (_dir, mut conn) = common::setup_test_db();
    conn.execute(
        "UPDATE schema_version SET checksum = 'tampered' WHERE migration_id = '001_initial_schema'",
        [],
    )
    .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Integrity);
    assert!(err.message().contains("001_initial_schema"));
}

#[test]
fn test_unknown_recorded_migration_rejected() {
    let (_dir, mut conn) = common::setup_test_db();
    conn.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES ('999_future', 0, 'x')",
        [],
    )
    .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Storage);
    assert!(err.message().contains("999_future"));
}
