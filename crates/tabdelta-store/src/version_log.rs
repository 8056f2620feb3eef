//! Version log persistence.
//!
//! Append-only ledger of delta descriptors. Each entry records which row ids
//! and which columns make up one saved snapshot, in snapshot order, so the
//! snapshot can be rebuilt from the row store at any later time.
//!
//! Every entry also stores an owner digest. The digest column is UNIQUE, so
//! the same owner reference can never be logged twice for a table.

#![allow(clippy::result_large_err)]

use crate::catalog::TableHandle;
use crate::errors::{serialization_error, storage_error, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use tabdelta_core::digest::owner_digest;
use tabdelta_core::errors::{ExError, ExErrorKind};
use tabdelta_core::model::{DeltaDescriptor, OwnerRef, RowId};

const SELECT_DESCRIPTOR: &str = "SELECT d.descriptor_id, t.name, d.seq, d.owner_json,
        d.row_ids_json, d.columns_json, d.created_at
     FROM delta_log d JOIN tracked_tables t ON t.table_id = d.table_id";

/// Append a descriptor for one saved snapshot.
///
/// Assigns a UUIDv7 descriptor id and the next sequence number for the table.
/// Meant to be called inside the save transaction.
///
/// ## Errors
///
/// - `ExErrorKind::Integrity`: a descriptor for the same owner reference
///   already exists for this table
/// - `ExErrorKind::Serialization`: JSON serialization failed
/// - `ExErrorKind::Storage`: database insert failed
pub fn append(
    conn: &Connection,
    table: &TableHandle,
    owner: &OwnerRef,
    row_ids: &[RowId],
    columns: &[String],
) -> Result<DeltaDescriptor> {
    let digest = owner_digest(&table.name, owner)?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT descriptor_id FROM delta_log WHERE owner_digest = ?1",
            [&digest],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| storage_error("version_log_append", &table.name, e))?;
    if let Some(existing) = existing {
        return Err(ExError::new(ExErrorKind::Integrity)
            .with_op("version_log_append")
            .with_table(&table.name)
            .with_entity_id(existing)
            .with_message("A descriptor for this owner reference is already logged"));
    }

    let seq: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM delta_log WHERE table_id = ?1",
            [table.table_id],
            |row| row.get(0),
        )
        .map_err(|e| storage_error("version_log_append", &table.name, e))?;

    let descriptor = DeltaDescriptor {
        descriptor_id: uuid::Uuid::now_v7().to_string(),
        table: table.name.clone(),
        seq: seq as u64,
        owner: owner.clone(),
        row_ids: row_ids.to_vec(),
        columns: columns.to_vec(),
        created_at_ms: chrono::Utc::now().timestamp_millis(),
    };

    let owner_json = serde_json::to_string(&descriptor.owner)
        .map_err(|e| serialization_error("version_log_append", e))?;
    let row_ids_json = serde_json::to_string(&descriptor.row_ids)
        .map_err(|e| serialization_error("version_log_append", e))?;
    let columns_json = serde_json::to_string(&descriptor.columns)
        .map_err(|e| serialization_error("version_log_append", e))?;

    conn.execute(
        r#"
        INSERT INTO delta_log (
            descriptor_id,
            table_id,
            seq,
            owner_json,
            owner_digest,
            row_ids_json,
            columns_json,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        rusqlite::params![
            descriptor.descriptor_id,
            table.table_id,
            seq,
            owner_json,
            digest,
            row_ids_json,
            columns_json,
            descriptor.created_at_ms,
        ],
    )
    .map_err(|e| storage_error("version_log_append", &table.name, e))?;

    tracing::debug!(
        descriptor_id = %descriptor.descriptor_id,
        table = %table.name,
        seq = seq,
        row_count = row_ids.len(),
        "Appended delta descriptor"
    );

    Ok(descriptor)
}

/// Read one descriptor by id
pub fn read(conn: &Connection, descriptor_id: &str) -> Result<Option<DeltaDescriptor>> {
    let raw = conn
        .query_row(
            &format!("{} WHERE d.descriptor_id = ?1", SELECT_DESCRIPTOR),
            [descriptor_id],
            raw_descriptor,
        )
        .optional()
        .map_err(|e| {
            ExError::new(ExErrorKind::Storage)
                .with_op("version_log_read")
                .with_entity_id(descriptor_id)
                .with_message(e.to_string())
        })?;
    raw.map(RawDescriptor::decode).transpose()
}

/// All descriptors of a table, oldest first
pub fn list(conn: &Connection, table: &TableHandle) -> Result<Vec<DeltaDescriptor>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE d.table_id = ?1 ORDER BY d.seq ASC",
            SELECT_DESCRIPTOR
        ))
        .map_err(|e| storage_error("version_log_list", &table.name, e))?;
    let raws = stmt
        .query_map([table.table_id], raw_descriptor)
        .map_err(|e| storage_error("version_log_list", &table.name, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| storage_error("version_log_list", &table.name, e))?;
    raws.into_iter().map(RawDescriptor::decode).collect()
}

/// Most recent descriptor of a table
pub fn latest(conn: &Connection, table: &TableHandle) -> Result<Option<DeltaDescriptor>> {
    let raw = conn
        .query_row(
            &format!(
                "{} WHERE d.table_id = ?1 ORDER BY d.seq DESC LIMIT 1",
                SELECT_DESCRIPTOR
            ),
            [table.table_id],
            raw_descriptor,
        )
        .optional()
        .map_err(|e| storage_error("version_log_latest", &table.name, e))?;
    raw.map(RawDescriptor::decode).transpose()
}

/// Number of descriptors logged for a table
pub fn count(conn: &Connection, table: &TableHandle) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM delta_log WHERE table_id = ?1",
        [table.table_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| storage_error("version_log_count", &table.name, e))
}

struct RawDescriptor {
    descriptor_id: String,
    table: String,
    seq: i64,
    owner_json: String,
    row_ids_json: String,
    columns_json: String,
    created_at_ms: i64,
}

fn raw_descriptor(row: &Row<'_>) -> rusqlite::Result<RawDescriptor> {
    Ok(RawDescriptor {
        descriptor_id: row.get(0)?,
        table: row.get(1)?,
        seq: row.get(2)?,
        owner_json: row.get(3)?,
        row_ids_json: row.get(4)?,
        columns_json: row.get(5)?,
        created_at_ms: row.get(6)?,
    })
}

impl RawDescriptor {
    fn decode(self) -> Result<DeltaDescriptor> {
        let op = "version_log_decode";
        Ok(DeltaDescriptor {
            owner: serde_json::from_str(&self.owner_json).map_err(|e| serialization_error(op, e))?,
            row_ids: serde_json::from_str(&self.row_ids_json)
                .map_err(|e| serialization_error(op, e))?,
            columns: serde_json::from_str(&self.columns_json)
                .map_err(|e| serialization_error(op, e))?,
            descriptor_id: self.descriptor_id,
            table: self.table,
            seq: self.seq as u64,
            created_at_ms: self.created_at_ms,
        })
    }
}
