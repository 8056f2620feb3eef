//! Snapshot save orchestration.
//!
//! ## Pipeline (in order):
//! 1. Validate and resolve the snapshot (no transaction yet)
//! 2. Open an IMMEDIATE transaction, load the registered schema
//! 3. Check type and index-column compatibility (no writes on failure)
//! 4. Look up candidate row ids and fetch their shared-column values
//! 5. Plan: reuse unchanged rows, insert changed or new ones
//! 6. Register new columns, then backfill, insert and re-point identities
//! 7. Append the delta descriptor and commit
//!
//! Any error drops the transaction, rolling back every write of the call.
//!
//! ## Logging Ownership
//!
//! This module owns lifecycle logging for `save_snapshot`. Lower layers
//! (store, core) use only `tracing::debug!()` for internal details.

#![allow(clippy::result_large_err)]

use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashMap;
use std::time::Instant;
use tabdelta_core::delta::{plan_delta, ExistingRow};
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::model::{Column, DeltaDescriptor, OwnerRef, RowId, Snapshot, Value};
use tabdelta_core::rules::{resolve_snapshot, split_columns};
use tabdelta_core::{log_op_end, log_op_error, log_op_start};
use tabdelta_store::catalog::{self, RegisteredColumn};
use tabdelta_store::errors::{from_rusqlite, Result};
use tabdelta_store::{identity, rows, version_log};

const OP: &str = "save_snapshot";

/// What a save did, for boundary logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SaveSummary {
    inserted: usize,
    reused: usize,
    backfilled: usize,
    new_columns: usize,
}

/// Save a full snapshot of `table` and return its delta descriptor
///
/// Only rows whose content changed (or whose logical index is new) are
/// written; unchanged rows reuse their existing row id.
///
/// ## Errors
///
/// - `TypeConflict`: a column is registered with another storage type
/// - `Schema`: the snapshot shape or logical index is unusable
/// - `Integrity`: the owner reference was already saved for this table, or
///   a backfill would overwrite a written cell
/// - `Storage`: database failure
pub fn save_snapshot(
    conn: &mut Connection,
    table: &str,
    snapshot: &Snapshot,
    owner: &OwnerRef,
) -> Result<DeltaDescriptor> {
    log_op_start!(OP, table = table, row_count = snapshot.len() as u64);
    let start = Instant::now();

    let (descriptor, summary) = save_snapshot_impl(conn, table, snapshot, owner).map_err(|e| {
        log_op_error!(
            OP,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            table = table
        );
        e
    })?;

    log_op_end!(
        OP,
        duration_ms = start.elapsed().as_millis() as u64,
        table = table,
        descriptor_id = descriptor.descriptor_id.as_str(),
        inserted = summary.inserted as u64,
        reused = summary.reused as u64,
        backfilled = summary.backfilled as u64,
        new_columns = summary.new_columns as u64
    );

    Ok(descriptor)
}

fn save_snapshot_impl(
    conn: &mut Connection,
    table: &str,
    snapshot: &Snapshot,
    owner: &OwnerRef,
) -> Result<(DeltaDescriptor, SaveSummary)> {
    let resolved = resolve_snapshot(snapshot)
        .map_err(|e| ExError::from(e).with_op(OP).with_table(table))?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let known = catalog::find_table(&tx, table)?;
    let registered = match &known {
        Some(handle) => catalog::columns(&tx, handle)?,
        None => Vec::new(),
    };
    let registered_columns: Vec<Column> = registered.iter().map(RegisteredColumn::column).collect();
    let split = split_columns(
        &resolved,
        &registered_columns,
        known.as_ref().map(|h| h.index_column.as_str()),
    )
    .map_err(|e| ExError::from(e).with_op(OP).with_table(table))?;

    let handle = match known {
        Some(handle) => handle,
        None => catalog::ensure_table(&tx, table, resolved.index_column())?,
    };

    let candidates = identity::lookup_many(&tx, &handle, &resolved.index_keys)?;
    let shared_names: Vec<String> = split
        .shared
        .iter()
        .map(|&p| resolved.columns[p].name.clone())
        .collect();
    let shared_columns = catalog::resolve_columns(&registered, table, &shared_names)?;
    let candidate_ids: Vec<RowId> = candidates.values().copied().collect();
    let mut fetched = rows::select_many(&tx, &handle, &candidate_ids, &shared_columns)?;

    let mut existing = HashMap::with_capacity(candidates.len());
    for (key, row_id) in candidates {
        let values = fetched.remove(&row_id).ok_or_else(|| {
            ExError::new(ExErrorKind::Integrity)
                .with_op(OP)
                .with_table(table)
                .with_entity_id(row_id.to_string())
                .with_message(format!("Identity entry {} points at a missing row", key))
        })?;
        existing.insert(key, ExistingRow { row_id, values });
    }

    let plan = plan_delta(&resolved, &split, &existing);

    let new_columns: Vec<Column> = split
        .new
        .iter()
        .map(|&p| resolved.columns[p].clone())
        .collect();
    catalog::add_columns(&tx, &handle, &new_columns)?;

    let all_registered = catalog::columns(&tx, &handle)?;
    let new_names: Vec<String> = new_columns.iter().map(|c| c.name.clone()).collect();
    let backfill_columns = catalog::resolve_columns(&all_registered, table, &new_names)?;
    let snapshot_columns =
        catalog::resolve_columns(&all_registered, table, &resolved.column_names())?;

    let backfills: Vec<(RowId, Vec<Value>)> = plan
        .backfills
        .iter()
        .map(|b| (b.row_id, b.values.clone()))
        .collect();
    rows::update_many(&tx, &handle, &backfill_columns, &backfills)?;

    let insert_rows: Vec<Vec<Value>> = plan.inserts.iter().map(|i| i.row.clone()).collect();
    let assigned = rows::insert_many(&tx, &handle, &snapshot_columns, &insert_rows)?;

    let identity_updates: Vec<(String, RowId)> = plan
        .inserts
        .iter()
        .zip(&assigned)
        .map(|(insert, row_id)| (insert.index_key.clone(), *row_id))
        .collect();
    identity::upsert_many(&tx, &handle, &identity_updates)?;

    let row_ids = plan
        .assemble_row_ids(&assigned)
        .filter(|ids| ids.len() == snapshot.len())
        .ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op(OP)
                .with_table(table)
                .with_message("Assembled row ids do not match the snapshot rows")
        })?;

    let descriptor =
        version_log::append(&tx, &handle, owner, &row_ids, &resolved.column_names())?;

    tx.commit().map_err(from_rusqlite)?;

    let summary = SaveSummary {
        inserted: plan.inserted_count(),
        reused: plan.reused_count(),
        backfilled: plan.backfills.len(),
        new_columns: new_columns.len(),
    };
    Ok((descriptor, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tabdelta_core::model::ColumnSpec;
    use tabdelta_store::migrations::apply_migrations;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    fn owner(line: u32) -> OwnerRef {
        OwnerRef::new("df", format!("main.py:{}", line))
            .at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_first_save_registers_table_and_rows() {
        let mut conn = setup();
        let snapshot = Snapshot::new(vec![
            ColumnSpec::new("id", "int64"),
            ColumnSpec::new("name", "object"),
        ])
        .with_row(vec![Value::Int(1), "Al".into()]);

        let descriptor = save_snapshot(&mut conn, "students", &snapshot, &owner(1)).unwrap();
        assert_eq!(descriptor.row_ids, vec![1]);
        assert_eq!(descriptor.columns, vec!["id", "name"]);
        assert_eq!(descriptor.seq, 1);

        let handle = catalog::find_table(&conn, "students").unwrap().unwrap();
        assert_eq!(handle.index_column, "id");
    }

    #[test]
    fn test_empty_snapshot_logs_empty_descriptor() {
        let mut conn = setup();
        let snapshot = Snapshot::new(vec![ColumnSpec::new("id", "int64")]);
        let descriptor = save_snapshot(&mut conn, "students", &snapshot, &owner(1)).unwrap();
        assert!(descriptor.row_ids.is_empty());
    }

    #[test]
    fn test_invalid_snapshot_carries_context() {
        let mut conn = setup();
        let err = save_snapshot(&mut conn, "students", &Snapshot::new(vec![]), &owner(1))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Schema);
        assert_eq!(err.op(), Some(OP));
        assert_eq!(err.table(), Some("students"));
        assert!(catalog::find_table(&conn, "students").unwrap().is_none());
    }
}
