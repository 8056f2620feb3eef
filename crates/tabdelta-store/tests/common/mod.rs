use rusqlite::Connection;
use tabdelta_store::catalog::{add_columns, ensure_table, RegisteredColumn, TableHandle};
use tabdelta_store::migrations::apply_migrations;
use tabdelta_core::model::{Column, StorageType};
use tempfile::TempDir;

/// Open a migrated database in a fresh temp directory
///
/// The TempDir must be kept alive for as long as the connection is used.
#[allow(dead_code)]
pub fn setup_test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut conn = Connection::open(dir.path().join("store.db")).expect("Failed to open db");
    apply_migrations(&mut conn).expect("Failed to apply migrations");
    (dir, conn)
}

/// Register a `students(id, name, age)` table
#[allow(dead_code)]
pub fn students_table(conn: &Connection) -> (TableHandle, Vec<RegisteredColumn>) {
    let table = ensure_table(conn, "students", "id").expect("Failed to register table");
    let columns = add_columns(
        conn,
        &table,
        &[
            Column::new("id", StorageType::Integer),
            Column::new("name", StorageType::Text),
            Column::new("age", StorageType::Double),
        ],
    )
    .expect("Failed to add columns");
    (table, columns)
}
