//! Snapshot reconstruction.
//!
//! A descriptor names row ids and columns; rebuilding fetches exactly those
//! cells from the row store in one batch and returns them in descriptor
//! order, typed with the registered column types.

#![allow(clippy::result_large_err)]

use rusqlite::Connection;
use std::time::Instant;
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::model::{DeltaDescriptor, RebuiltSnapshot};
use tabdelta_core::{log_op_end, log_op_error, log_op_start};
use tabdelta_store::errors::Result;
use tabdelta_store::{catalog, rows, version_log};

/// Rebuild the snapshot a descriptor was logged for
///
/// ## Errors
///
/// - `Storage`: the table, a column or a row id named by the descriptor is
///   missing, or a stored cell cannot be decoded
pub fn rebuild(conn: &Connection, descriptor: &DeltaDescriptor) -> Result<RebuiltSnapshot> {
    log_op_start!(
        "rebuild",
        table = descriptor.table.as_str(),
        descriptor_id = descriptor.descriptor_id.as_str()
    );
    let start = Instant::now();

    let rebuilt = rebuild_impl(conn, descriptor).map_err(|e| {
        log_op_error!(
            "rebuild",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            descriptor_id = descriptor.descriptor_id.as_str()
        );
        e
    })?;

    log_op_end!(
        "rebuild",
        duration_ms = start.elapsed().as_millis() as u64,
        row_count = rebuilt.rows.len() as u64
    );
    Ok(rebuilt)
}

/// Rebuild the snapshot logged under `descriptor_id`
///
/// ## Errors
///
/// - `NotFound`: no descriptor has this id
/// - otherwise as [`rebuild`]
pub fn rebuild_by_id(conn: &Connection, descriptor_id: &str) -> Result<RebuiltSnapshot> {
    let descriptor = version_log::read(conn, descriptor_id)?.ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("rebuild_by_id")
            .with_entity_id(descriptor_id)
            .with_message("Delta descriptor not found")
    })?;
    rebuild(conn, &descriptor)
}

fn rebuild_impl(conn: &Connection, descriptor: &DeltaDescriptor) -> Result<RebuiltSnapshot> {
    let table = &descriptor.table;
    let handle = catalog::find_table(conn, table)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Storage)
            .with_op("rebuild")
            .with_table(table)
            .with_entity_id(&descriptor.descriptor_id)
            .with_message("Table named by the descriptor is not tracked")
    })?;

    let registered = catalog::columns(conn, &handle)?;
    let columns = catalog::resolve_columns(&registered, table, &descriptor.columns)?;
    let fetched = rows::select_many(conn, &handle, &descriptor.row_ids, &columns)?;

    let rows = descriptor
        .row_ids
        .iter()
        .map(|row_id| {
            fetched.get(row_id).cloned().ok_or_else(|| {
                ExError::new(ExErrorKind::Storage)
                    .with_op("rebuild")
                    .with_table(table)
                    .with_entity_id(row_id.to_string())
                    .with_message("Row named by the descriptor is missing")
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RebuiltSnapshot {
        columns: columns.iter().map(|c| c.column()).collect(),
        rows,
    })
}
