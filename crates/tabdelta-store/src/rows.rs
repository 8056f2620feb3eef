//! Shared row store
//!
//! One physical table per tracked table holds every row version ever saved.
//! Rows are only ever inserted, or backfilled with values for columns added
//! after they were written. A backfill never overwrites a non-null cell.

#![allow(clippy::result_large_err)]

use crate::catalog::{RegisteredColumn, TableHandle};
use crate::codec::{decode, encode, CellRef};
use crate::errors::{serialization_error, storage_error, Result};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashMap;
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::model::{RowId, Value};

/// Fetch `columns` for each of `row_ids`
///
/// Values are aligned to `columns`. Row ids that do not exist are absent
/// from the result; callers decide whether that is an error.
pub fn select_many(
    conn: &Connection,
    table: &TableHandle,
    row_ids: &[RowId],
    columns: &[RegisteredColumn],
) -> Result<HashMap<RowId, Vec<Value>>> {
    if row_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let ids_json = serde_json::to_string(row_ids).map_err(|e| serialization_error("select_many", e))?;

    let mut select_list = vec!["row_id".to_string()];
    select_list.extend(columns.iter().map(|c| c.physical_name.clone()));
    let sql = format!(
        "SELECT {} FROM {} WHERE row_id IN (SELECT value FROM json_each(?1))",
        select_list.join(", "),
        table.physical_table()
    );

    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| storage_error("select_many", &table.name, e))?;
    let mut rows = stmt
        .query([ids_json])
        .map_err(|e| storage_error("select_many", &table.name, e))?;

    let mut found = HashMap::with_capacity(row_ids.len());
    while let Some(row) = rows
        .next()
        .map_err(|e| storage_error("select_many", &table.name, e))?
    {
        let row_id: RowId = row
            .get(0)
            .map_err(|e| storage_error("select_many", &table.name, e))?;
        let mut values = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let raw = row
                .get_ref(i + 1)
                .map_err(|e| storage_error("select_many", &table.name, e))?;
            let cell = CellRef {
                table: &table.name,
                column: &column.name,
                row_id,
            };
            values.push(decode(cell, raw, column.storage_type)?);
        }
        found.insert(row_id, values);
    }

    tracing::debug!(
        table = %table.name,
        requested = row_ids.len(),
        found = found.len(),
        "Selected rows"
    );
    Ok(found)
}

/// Insert full rows and return their assigned row ids, in input order
///
/// Each row is aligned to `columns`.
pub fn insert_many(
    conn: &Connection,
    table: &TableHandle,
    columns: &[RegisteredColumn],
    rows: &[Vec<Value>],
) -> Result<Vec<RowId>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table.physical_table())
    } else {
        let names: Vec<&str> = columns.iter().map(|c| c.physical_name.as_str()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.physical_table(),
            names.join(", "),
            placeholders.join(", ")
        )
    };

    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| storage_error("insert_many", &table.name, e))?;

    let mut assigned = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != columns.len() {
            return Err(ExError::new(ExErrorKind::Internal)
                .with_op("insert_many")
                .with_table(&table.name)
                .with_message(format!(
                    "Row has {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
        }
        stmt.execute(params_from_iter(row.iter().map(encode)))
            .map_err(|e| storage_error("insert_many", &table.name, e))?;
        assigned.push(conn.last_insert_rowid());
    }

    tracing::debug!(
        table = %table.name,
        inserted = assigned.len(),
        first_row_id = assigned.first().copied().unwrap_or_default(),
        "Inserted rows"
    );
    Ok(assigned)
}

/// Backfill `columns` on existing rows
///
/// Each update is aligned to `columns`. The write only applies while every
/// target cell is still NULL.
///
/// ## Errors
///
/// - `ExErrorKind::Integrity`: the row is missing or a target cell is
///   already set
/// - `ExErrorKind::Storage`: database failure
pub fn update_many(
    conn: &Connection,
    table: &TableHandle,
    columns: &[RegisteredColumn],
    updates: &[(RowId, Vec<Value>)],
) -> Result<()> {
    if updates.is_empty() || columns.is_empty() {
        return Ok(());
    }

    let n = columns.len();
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c.physical_name, i + 1))
        .collect();
    let guards: Vec<String> = columns
        .iter()
        .map(|c| format!("{} IS NULL", c.physical_name))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE row_id = ?{} AND {}",
        table.physical_table(),
        assignments.join(", "),
        n + 1,
        guards.join(" AND ")
    );

    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| storage_error("update_many", &table.name, e))?;

    for (row_id, values) in updates {
        let mut bound: Vec<rusqlite::types::Value> = values.iter().map(encode).collect();
        bound.push(rusqlite::types::Value::Integer(*row_id));
        let changed = stmt
            .execute(params_from_iter(bound))
            .map_err(|e| storage_error("update_many", &table.name, e))?;
        if changed == 0 {
            return Err(ExError::new(ExErrorKind::Integrity)
                .with_op("update_many")
                .with_table(&table.name)
                .with_entity_id(row_id.to_string())
                .with_message("Backfill target row is missing or already holds values"));
        }
    }

    tracing::debug!(table = %table.name, backfilled = updates.len(), "Backfilled rows");
    Ok(())
}

/// Number of physical rows stored for a table
pub fn count(conn: &Connection, table: &TableHandle) -> Result<u64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.physical_table()),
        [],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| storage_error("row_count", &table.name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{add_columns, ensure_table};
    use crate::migrations::apply_migrations;
    use tabdelta_core::model::{Column, StorageType};

    fn setup() -> (Connection, TableHandle, Vec<RegisteredColumn>) {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let table = ensure_table(&conn, "students", "id").unwrap();
        let cols = add_columns(
            &conn,
            &table,
            &[
                Column::new("id", StorageType::Integer),
                Column::new("name", StorageType::Text),
            ],
        )
        .unwrap();
        (conn, table, cols)
    }

    #[test]
    fn test_insert_then_select_preserves_order() {
        let (conn, table, cols) = setup();
        let ids = insert_many(
            &conn,
            &table,
            &cols,
            &[
                vec![Value::Int(1), "Al".into()],
                vec![Value::Int(2), "Bo".into()],
            ],
        )
        .unwrap();
        assert_eq!(ids, vec![1, 2]);

        let rows = select_many(&conn, &table, &[2, 1, 99], &cols[1..]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[&2], vec![Value::from("Bo")]);
        assert_eq!(count(&conn, &table).unwrap(), 2);
    }

    #[test]
    fn test_backfill_writes_null_cells_once() {
        let (conn, table, _) = setup();
        let cols = add_columns(&conn, &table, &[Column::new("grade", StorageType::Text)]).unwrap();
        insert_many(&conn, &table, &[], &[vec![]]).unwrap();

        update_many(&conn, &table, &cols, &[(1, vec!["A".into()])]).unwrap();
        let err = update_many(&conn, &table, &cols, &[(1, vec!["B".into()])]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Integrity);

        let rows = select_many(&conn, &table, &[1], &cols).unwrap();
        assert_eq!(rows[&1], vec![Value::from("A")]);
    }

    #[test]
    fn test_backfill_missing_row_is_integrity_error() {
        let (conn, table, cols) = setup();
        let err = update_many(&conn, &table, &cols[1..], &[(42, vec![Value::Null])]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Integrity);
        assert_eq!(err.entity_id(), Some("42"));
    }
}
