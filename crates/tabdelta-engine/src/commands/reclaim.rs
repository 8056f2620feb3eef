//! Explicit reclamation of a table's physical storage.
//!
//! Runs under an EXCLUSIVE transaction and is never chained after a save.
//! Visible (row id, column) values are unchanged by a run.

#![allow(clippy::result_large_err)]

use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::{log_op_end, log_op_error, log_op_start};
use tabdelta_store::errors::{from_rusqlite, Result};
use tabdelta_store::reclaim::{page_count, rebuild_physical_table, vacuum};
use tabdelta_store::{catalog, ReclaimOptions, ReclaimReport};

/// Rebuild the physical row table of `table`, optionally followed by VACUUM
///
/// ## Errors
///
/// - `NotFound`: the table is not tracked
/// - `Storage`: database failure, including a busy database
pub fn reclaim_table(
    conn: &mut Connection,
    table: &str,
    options: ReclaimOptions,
) -> Result<ReclaimReport> {
    log_op_start!("reclaim", table = table, vacuum = options.vacuum);
    let start = Instant::now();

    let report = reclaim_impl(conn, table, options).map_err(|e| {
        log_op_error!(
            "reclaim",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            table = table
        );
        e
    })?;

    log_op_end!(
        "reclaim",
        duration_ms = start.elapsed().as_millis() as u64,
        table = table,
        row_count = report.rows_copied,
        pages_before = report.pages_before,
        pages_after = report.pages_after
    );
    Ok(report)
}

fn reclaim_impl(
    conn: &mut Connection,
    table: &str,
    options: ReclaimOptions,
) -> Result<ReclaimReport> {
    let pages_before = page_count(conn)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Exclusive)
        .map_err(from_rusqlite)?;
    let handle = catalog::find_table(&tx, table)?.ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("reclaim")
            .with_table(table)
            .with_message("Table is not tracked")
    })?;
    let columns = catalog::columns(&tx, &handle)?;
    let rows_copied = rebuild_physical_table(&tx, &handle, &columns)?;
    tx.commit().map_err(from_rusqlite)?;

    if options.vacuum {
        vacuum(conn)?;
    }

    Ok(ReclaimReport {
        table: handle.name,
        rows_copied,
        pages_before,
        pages_after: page_count(conn)?,
        vacuumed: options.vacuum,
    })
}
