//! Value model: storage types, cell values, snapshots and descriptors.

pub mod snapshot;
pub mod types;
pub mod value;

pub use snapshot::{
    Column, ColumnSpec, DeltaDescriptor, OwnerRef, RebuiltSnapshot, RowId, Snapshot,
};
pub use types::{SemanticType, StorageType};
pub use value::Value;
