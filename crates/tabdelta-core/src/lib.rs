//! Pure domain layer of the snapshot store: value model, type mapping,
//! normalization, validation and delta planning. No I/O.

pub mod delta;
pub mod digest;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod normalize;
pub mod rules;

pub use errors::{ExError, ExErrorKind, SnapshotError};
