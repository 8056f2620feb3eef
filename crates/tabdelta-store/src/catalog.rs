//! Schema registry
//!
//! Tracks which tables exist, their logical index column, and the columns
//! registered for each table's physical row table. Evolution is additive
//! only: columns are added, never removed or retyped.
//!
//! Logical column names never reach SQL text. Each registered column is
//! backed by a physical column named `c{ordinal}` in `rows_{table_id}`.

#![allow(clippy::result_large_err)]

use crate::codec::sql_decl;
use crate::errors::{from_rusqlite, storage_error, Result};
use rusqlite::{Connection, OptionalExtension};
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::model::{Column, StorageType};

/// A tracked table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub table_id: i64,
    pub name: String,
    /// Logical index column, fixed by the first save
    pub index_column: String,
}

impl TableHandle {
    /// Name of the physical row table
    pub fn physical_table(&self) -> String {
        format!("rows_{}", self.table_id)
    }
}

/// A column registered for a tracked table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredColumn {
    pub name: String,
    pub storage_type: StorageType,
    pub ordinal: i64,
    pub physical_name: String,
}

impl RegisteredColumn {
    pub fn column(&self) -> Column {
        Column::new(self.name.clone(), self.storage_type)
    }
}

/// Look up a tracked table by name
pub fn find_table(conn: &Connection, name: &str) -> Result<Option<TableHandle>> {
    conn.query_row(
        "SELECT table_id, name, index_column FROM tracked_tables WHERE name = ?1",
        [name],
        |row| {
            Ok(TableHandle {
                table_id: row.get(0)?,
                name: row.get(1)?,
                index_column: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(|e| storage_error("find_table", name, e))
}

/// All tracked tables, in registration order
pub fn list_tables(conn: &Connection) -> Result<Vec<TableHandle>> {
    let mut stmt = conn
        .prepare("SELECT table_id, name, index_column FROM tracked_tables ORDER BY table_id")
        .map_err(from_rusqlite)?;
    let tables = stmt
        .query_map([], |row| {
            Ok(TableHandle {
                table_id: row.get(0)?,
                name: row.get(1)?,
                index_column: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(tables)
}

/// Return the tracked table `name`, registering it first if needed
///
/// Registration creates the empty physical row table. An existing table is
/// returned as is; checking its index column is left to the caller.
pub fn ensure_table(conn: &Connection, name: &str, index_column: &str) -> Result<TableHandle> {
    if name.trim().is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("ensure_table")
            .with_message("Table name must not be empty"));
    }

    if let Some(existing) = find_table(conn, name)? {
        return Ok(existing);
    }

    conn.execute(
        "INSERT INTO tracked_tables (name, index_column, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, index_column, chrono::Utc::now().timestamp_millis()],
    )
    .map_err(|e| storage_error("ensure_table", name, e))?;

    let handle = TableHandle {
        table_id: conn.last_insert_rowid(),
        name: name.to_string(),
        index_column: index_column.to_string(),
    };

    conn.execute_batch(&format!(
        "CREATE TABLE {} (row_id INTEGER PRIMARY KEY AUTOINCREMENT);",
        handle.physical_table()
    ))
    .map_err(|e| storage_error("ensure_table", name, e))?;

    tracing::debug!(
        table = %name,
        table_id = handle.table_id,
        index_column = %index_column,
        "Registered table"
    );

    Ok(handle)
}

/// Registered columns of a table, in ordinal order
pub fn columns(conn: &Connection, table: &TableHandle) -> Result<Vec<RegisteredColumn>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT name, storage_type, ordinal, physical_name
             FROM table_columns WHERE table_id = ?1 ORDER BY ordinal",
        )
        .map_err(|e| storage_error("columns", &table.name, e))?;

    let raw = stmt
        .query_map([table.table_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| storage_error("columns", &table.name, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| storage_error("columns", &table.name, e))?;

    raw.into_iter()
        .map(|(name, type_tag, ordinal, physical_name)| {
            let storage_type = StorageType::parse(&type_tag).ok_or_else(|| {
                ExError::new(ExErrorKind::Storage)
                    .with_op("columns")
                    .with_table(&table.name)
                    .with_column(&name)
                    .with_message(format!("Unknown storage type '{}'", type_tag))
            })?;
            Ok(RegisteredColumn {
                name,
                storage_type,
                ordinal,
                physical_name,
            })
        })
        .collect()
}

/// Register columns on a table
///
/// Re-adding a column with its registered type is a no-op. Returns only the
/// columns that were actually added.
///
/// ## Errors
///
/// - `ExErrorKind::Schema`: a column is already registered with another type
/// - `ExErrorKind::Storage`: database failure
pub fn add_columns(
    conn: &Connection,
    table: &TableHandle,
    new_columns: &[Column],
) -> Result<Vec<RegisteredColumn>> {
    let existing = columns(conn, table)?;
    let mut next_ordinal = existing.iter().map(|c| c.ordinal + 1).max().unwrap_or(0);
    let mut added = Vec::new();

    for column in new_columns {
        let registered = existing
            .iter()
            .chain(added.iter())
            .find(|c: &&RegisteredColumn| c.name == column.name);
        if let Some(registered) = registered {
            if registered.storage_type != column.storage_type {
                return Err(ExError::new(ExErrorKind::Schema)
                    .with_op("add_columns")
                    .with_table(&table.name)
                    .with_column(&column.name)
                    .with_message(format!(
                        "Column is registered as {}; columns cannot be retyped to {}",
                        registered.storage_type, column.storage_type
                    )));
            }
            continue;
        }

        let physical_name = format!("c{}", next_ordinal);
        conn.execute(
            "INSERT INTO table_columns
                (table_id, name, storage_type, ordinal, physical_name, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                table.table_id,
                column.name,
                column.storage_type.as_str(),
                next_ordinal,
                physical_name,
                chrono::Utc::now().timestamp_millis(),
            ],
        )
        .map_err(|e| storage_error("add_columns", &table.name, e))?;

        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {};",
            table.physical_table(),
            physical_name,
            sql_decl(column.storage_type)
        ))
        .map_err(|e| storage_error("add_columns", &table.name, e))?;

        added.push(RegisteredColumn {
            name: column.name.clone(),
            storage_type: column.storage_type,
            ordinal: next_ordinal,
            physical_name,
        });
        next_ordinal += 1;
    }

    if !added.is_empty() {
        tracing::debug!(
            table = %table.name,
            new_columns = added.len(),
            "Added columns"
        );
    }

    Ok(added)
}

/// Resolve logical column names to registered columns, preserving order
///
/// ## Errors
///
/// `ExErrorKind::Storage` naming the first column that is not registered.
pub fn resolve_columns(
    registered: &[RegisteredColumn],
    table: &str,
    names: &[String],
) -> Result<Vec<RegisteredColumn>> {
    names
        .iter()
        .map(|name| {
            registered
                .iter()
                .find(|c| &c.name == name)
                .cloned()
                .ok_or_else(|| {
                    ExError::new(ExErrorKind::Storage)
                        .with_op("resolve_columns")
                        .with_table(table)
                        .with_column(name)
                        .with_message("Column is not registered for this table")
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_ensure_table_is_idempotent() {
        let conn = setup();
        let first = ensure_table(&conn, "students", "id").unwrap();
        let second = ensure_table(&conn, "students", "other").unwrap();
        assert_eq!(first, second);
        assert_eq!(second.index_column, "id");
        assert_eq!(first.physical_table(), format!("rows_{}", first.table_id));
    }

    #[test]
    fn test_add_columns_assigns_ordinals() {
        let conn = setup();
        let table = ensure_table(&conn, "students", "id").unwrap();
        add_columns(
            &conn,
            &table,
            &[
                Column::new("id", StorageType::Integer),
                Column::new("name", StorageType::Text),
            ],
        )
        .unwrap();
        let added = add_columns(
            &conn,
            &table,
            &[
                Column::new("name", StorageType::Text),
                Column::new("grade", StorageType::Text),
            ],
        )
        .unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].physical_name, "c2");

        let names: Vec<_> = columns(&conn, &table)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["id", "name", "grade"]);
    }

    #[test]
    fn test_add_columns_rejects_retype() {
        let conn = setup();
        let table = ensure_table(&conn, "students", "id").unwrap();
        add_columns(&conn, &table, &[Column::new("age", StorageType::Double)]).unwrap();
        let err = add_columns(&conn, &table, &[Column::new("age", StorageType::Text)])
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Schema);
        assert_eq!(err.column(), Some("age"));
    }

    #[test]
    fn test_resolve_columns_reports_missing() {
        let conn = setup();
        let table = ensure_table(&conn, "students", "id").unwrap();
        let registered =
            add_columns(&conn, &table, &[Column::new("id", StorageType::Integer)]).unwrap();
        let err = resolve_columns(&registered, "students", &["grade".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert_eq!(err.column(), Some("grade"));
    }
}
