//! Row classification for a save.
//!
//! Given a resolved snapshot and the rows currently pointed to by the
//! identity index, decide per snapshot row whether its row id is reused or a
//! new row must be inserted. Pure: the store executes the plan.

use crate::digest::row_digest;
use crate::model::snapshot::RowId;
use crate::model::value::Value;
use crate::normalize::normalize_row;
use crate::rules::validation::{ColumnSplit, ResolvedSnapshot};
use std::collections::HashMap;

/// A row currently pointed to by the identity index
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingRow {
    pub row_id: RowId,
    /// Values of the shared columns, in `ColumnSplit::shared` order
    pub values: Vec<Value>,
}

/// Where a snapshot row's row id comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSlot {
    Reused(RowId),
    /// Position in `DeltaPlan::inserts`
    Inserted(usize),
}

/// New-column values to write onto a reused row
#[derive(Debug, Clone, PartialEq)]
pub struct Backfill {
    pub row_id: RowId,
    /// Values of the new columns, in `ColumnSplit::new` order
    pub values: Vec<Value>,
}

/// A full-column row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInsert {
    /// Aligned to the snapshot's columns
    pub row: Vec<Value>,
    pub index_key: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaPlan {
    /// One per snapshot row, in snapshot row order
    pub slots: Vec<RowSlot>,
    pub backfills: Vec<Backfill>,
    pub inserts: Vec<PendingInsert>,
}

impl DeltaPlan {
    pub fn reused_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, RowSlot::Reused(_)))
            .count()
    }

    pub fn inserted_count(&self) -> usize {
        self.inserts.len()
    }

    /// Final row id list, given the ids assigned to `inserts` in order
    ///
    /// Returns `None` if `assigned` does not cover every insert.
    pub fn assemble_row_ids(&self, assigned: &[RowId]) -> Option<Vec<RowId>> {
        if assigned.len() != self.inserts.len() {
            return None;
        }
        self.slots
            .iter()
            .map(|slot| match slot {
                RowSlot::Reused(id) => Some(*id),
                RowSlot::Inserted(pos) => assigned.get(*pos).copied(),
            })
            .collect()
    }
}

/// Classify every snapshot row
///
/// `existing` maps index keys to the row their identity entry points at. A
/// row is reused only when the digests of the normalized shared values match
/// and the normalized tuples are equal.
pub fn plan_delta(
    resolved: &ResolvedSnapshot,
    split: &ColumnSplit,
    existing: &HashMap<String, ExistingRow>,
) -> DeltaPlan {
    let shared_types = resolved.types_at(&split.shared);
    let mut plan = DeltaPlan {
        slots: Vec::with_capacity(resolved.len()),
        ..DeltaPlan::default()
    };

    for (row, key) in resolved.rows.iter().zip(&resolved.index_keys) {
        let reused = existing.get(key).filter(|prior| {
            let shared: Vec<Value> = split.shared.iter().map(|&p| row[p].clone()).collect();
            let ours = normalize_row(&shared, &shared_types);
            let theirs = normalize_row(&prior.values, &shared_types);
            row_digest(&ours) == row_digest(&theirs) && ours == theirs
        });

        match reused {
            Some(prior) => {
                plan.slots.push(RowSlot::Reused(prior.row_id));
                if !split.new.is_empty() {
                    plan.backfills.push(Backfill {
                        row_id: prior.row_id,
                        values: split.new.iter().map(|&p| row[p].clone()).collect(),
                    });
                }
            }
            None => {
                plan.slots.push(RowSlot::Inserted(plan.inserts.len()));
                plan.inserts.push(PendingInsert {
                    row: row.clone(),
                    index_key: key.clone(),
                });
            }
        }
    }

    tracing::debug!(
        rows = resolved.len(),
        reused = plan.reused_count(),
        inserted = plan.inserted_count(),
        backfilled = plan.backfills.len(),
        "delta planned"
    );
    plan
}
