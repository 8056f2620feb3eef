//! Physical-table reclamation
//!
//! Rewrites a table's row table into a fresh one, row ids included, then
//! swaps it in. Every (row id, column) value stays as it was; only the
//! physical layout changes. Space is returned to the OS by an optional
//! `VACUUM` afterwards, which must run outside any transaction.

#![allow(clippy::result_large_err)]

use crate::catalog::{RegisteredColumn, TableHandle};
use crate::codec::sql_decl;
use crate::errors::{from_rusqlite, storage_error, Result};
use rusqlite::{Connection, OptionalExtension};

/// Outcome of a reclamation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimReport {
    pub table: String,
    pub rows_copied: u64,
    /// Database size in pages before the run
    pub pages_before: i64,
    pub pages_after: i64,
    pub vacuumed: bool,
}

/// Rebuild the physical row table of `table`
///
/// Must run inside an exclusive transaction. The AUTOINCREMENT high-water
/// mark is carried over so row ids are never handed out twice.
pub fn rebuild_physical_table(
    conn: &Connection,
    table: &TableHandle,
    columns: &[RegisteredColumn],
) -> Result<u64> {
    let physical = table.physical_table();
    let scratch = format!("{}__reclaim", physical);
    let op = "rebuild_physical_table";

    let high_water: Option<i64> = conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = ?1",
            [&physical],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| storage_error(op, &table.name, e))?;

    let mut decls = vec!["row_id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    decls.extend(
        columns
            .iter()
            .map(|c| format!("{} {}", c.physical_name, sql_decl(c.storage_type))),
    );
    let mut copied = vec!["row_id".to_string()];
    copied.extend(columns.iter().map(|c| c.physical_name.clone()));
    let copied = copied.join(", ");

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {scratch};
         CREATE TABLE {scratch} ({decls});",
        scratch = scratch,
        decls = decls.join(", ")
    ))
    .map_err(|e| storage_error(op, &table.name, e))?;

    let rows_copied = conn
        .execute(
            &format!(
                "INSERT INTO {scratch} ({cols}) SELECT {cols} FROM {physical} ORDER BY row_id",
                scratch = scratch,
                cols = copied,
                physical = physical
            ),
            [],
        )
        .map_err(|e| storage_error(op, &table.name, e))?;

    conn.execute_batch(&format!(
        "DROP TABLE {physical};
         ALTER TABLE {scratch} RENAME TO {physical};",
        physical = physical,
        scratch = scratch
    ))
    .map_err(|e| storage_error(op, &table.name, e))?;

    if let Some(high_water) = high_water {
        let updated = conn
            .execute(
                "UPDATE sqlite_sequence SET seq = MAX(seq, ?2) WHERE name = ?1",
                rusqlite::params![physical, high_water],
            )
            .map_err(|e| storage_error(op, &table.name, e))?;
        if updated == 0 {
            conn.execute(
                "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
                rusqlite::params![physical, high_water],
            )
            .map_err(|e| storage_error(op, &table.name, e))?;
        }
    }

    tracing::debug!(
        table = %table.name,
        rows_copied,
        high_water = high_water.unwrap_or_default(),
        "Rebuilt physical table"
    );
    Ok(rows_copied as u64)
}

/// Current database size in pages
pub fn page_count(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA page_count", [], |row| row.get(0))
        .map_err(from_rusqlite)
}

/// Return free pages to the OS
pub fn vacuum(conn: &Connection) -> Result<()> {
    conn.execute_batch("VACUUM;").map_err(from_rusqlite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{add_columns, ensure_table};
    use crate::migrations::apply_migrations;
    use crate::rows::{insert_many, select_many};
    use tabdelta_core::model::{Column, StorageType, Value};

    #[test]
    fn test_rebuild_keeps_rows_and_high_water_mark() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let table = ensure_table(&conn, "students", "id").unwrap();
        let cols = add_columns(
            &conn,
            &table,
            &[
                Column::new("id", StorageType::Integer),
                Column::new("age", StorageType::Double),
            ],
        )
        .unwrap();
        insert_many(
            &conn,
            &table,
            &cols,
            &[
                vec![Value::Int(1), Value::Float(20.0)],
                vec![Value::Int(2), Value::Null],
            ],
        )
        .unwrap();

        let tx = conn.transaction().unwrap();
        assert_eq!(rebuild_physical_table(&tx, &table, &cols).unwrap(), 2);
        tx.commit().unwrap();

        let rows = select_many(&conn, &table, &[1, 2], &cols).unwrap();
        assert_eq!(rows[&1], vec![Value::Int(1), Value::Float(20.0)]);
        assert_eq!(rows[&2], vec![Value::Int(2), Value::Null]);

        let next = insert_many(&conn, &table, &cols, &[vec![Value::Int(3), Value::Null]]).unwrap();
        assert_eq!(next, vec![3]);
    }

    #[test]
    fn test_rebuild_empty_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let table = ensure_table(&conn, "empty", "id").unwrap();
        assert_eq!(rebuild_physical_table(&conn, &table, &[]).unwrap(), 0);
        assert!(page_count(&conn).unwrap() > 0);
    }
}
