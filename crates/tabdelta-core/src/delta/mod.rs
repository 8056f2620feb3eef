//! Delta planning: which snapshot rows are reused, backfilled or inserted.

pub mod plan;

pub use plan::{plan_delta, Backfill, DeltaPlan, ExistingRow, PendingInsert, RowSlot};
