//! Identity index: logical index key -> row id of the latest row version
//!
//! Reads are one statement per batch (`json_each` over the key list); writes
//! reuse one cached statement inside the caller's transaction.

#![allow(clippy::result_large_err)]

use crate::catalog::TableHandle;
use crate::errors::{serialization_error, storage_error, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use tabdelta_core::model::RowId;

/// Row ids currently recorded for `keys`; absent keys are omitted
pub fn lookup_many(
    conn: &Connection,
    table: &TableHandle,
    keys: &[String],
) -> Result<HashMap<String, RowId>> {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }
    let keys_json = serde_json::to_string(keys).map_err(|e| serialization_error("lookup_many", e))?;

    let mut stmt = conn
        .prepare_cached(
            "SELECT index_key, row_id FROM identity_index
             WHERE table_id = ?1 AND index_key IN (SELECT value FROM json_each(?2))",
        )
        .map_err(|e| storage_error("lookup_many", &table.name, e))?;

    let found = stmt
        .query_map(rusqlite::params![table.table_id, keys_json], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, RowId>(1)?))
        })
        .map_err(|e| storage_error("lookup_many", &table.name, e))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()
        .map_err(|e| storage_error("lookup_many", &table.name, e))?;

    tracing::debug!(
        table = %table.name,
        requested = keys.len(),
        found = found.len(),
        "Identity lookup"
    );
    Ok(found)
}

/// Point each key at its row id, inserting or replacing entries
pub fn upsert_many(conn: &Connection, table: &TableHandle, entries: &[(String, RowId)]) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let now = chrono::Utc::now().timestamp_millis();
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO identity_index (table_id, index_key, row_id, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (table_id, index_key)
             DO UPDATE SET row_id = excluded.row_id, updated_at = excluded.updated_at",
        )
        .map_err(|e| storage_error("upsert_many", &table.name, e))?;

    for (key, row_id) in entries {
        stmt.execute(rusqlite::params![table.table_id, key, row_id, now])
            .map_err(|e| storage_error("upsert_many", &table.name, e))?;
    }

    tracing::debug!(table = %table.name, entries = entries.len(), "Identity upsert");
    Ok(())
}

/// Number of logical indices tracked for a table
pub fn count(conn: &Connection, table: &TableHandle) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM identity_index WHERE table_id = ?1",
        [table.table_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| storage_error("identity_count", &table.name, e))
}
