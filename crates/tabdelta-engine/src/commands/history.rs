//! Read-only queries over the version log and table statistics.

#![allow(clippy::result_large_err)]

use rusqlite::Connection;
use serde::Serialize;
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::model::{Column, DeltaDescriptor};
use tabdelta_store::catalog::{self, TableHandle};
use tabdelta_store::errors::Result;
use tabdelta_store::{identity, rows, version_log};

/// Size and shape of one tracked table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub table: String,
    pub index_column: String,
    pub columns: Vec<Column>,
    /// Snapshots saved
    pub descriptors: u64,
    /// Row versions stored, across all snapshots
    pub physical_rows: u64,
    /// Distinct logical index values ever seen
    pub logical_indices: u64,
}

fn require_table(conn: &Connection, table: &str, op: &str) -> Result<TableHandle> {
    catalog::find_table(conn, table)?.ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op(op)
            .with_table(table)
            .with_message("Table is not tracked")
    })
}

/// Every descriptor of `table`, oldest first
pub fn history(conn: &Connection, table: &str) -> Result<Vec<DeltaDescriptor>> {
    let handle = require_table(conn, table, "history")?;
    version_log::list(conn, &handle)
}

/// Most recent descriptor of `table`, if it was ever saved
pub fn latest(conn: &Connection, table: &str) -> Result<Option<DeltaDescriptor>> {
    match catalog::find_table(conn, table)? {
        Some(handle) => version_log::latest(conn, &handle),
        None => Ok(None),
    }
}

/// Names of all tracked tables
pub fn tables(conn: &Connection) -> Result<Vec<String>> {
    Ok(catalog::list_tables(conn)?
        .into_iter()
        .map(|t| t.name)
        .collect())
}

pub fn stats(conn: &Connection, table: &str) -> Result<TableStats> {
    let handle = require_table(conn, table, "stats")?;
    let columns = catalog::columns(conn, &handle)?
        .iter()
        .map(|c| c.column())
        .collect();

    Ok(TableStats {
        table: handle.name.clone(),
        index_column: handle.index_column.clone(),
        columns,
        descriptors: version_log::count(conn, &handle)?,
        physical_rows: rows::count(conn, &handle)?,
        logical_indices: identity::count(conn, &handle)?,
    })
}
