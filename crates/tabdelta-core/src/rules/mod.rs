//! Snapshot validation rules.

pub mod validation;

pub use validation::{resolve_snapshot, split_columns, ColumnSplit, ResolvedSnapshot};
