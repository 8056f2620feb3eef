//! tabdelta Engine - Orchestration layer
//!
//! Coordinates validation and delta planning from `tabdelta-core` with
//! persistence in `tabdelta-store`. Owns transaction boundaries and
//! operation-boundary logging.

pub mod commands;
pub mod engine;

pub use engine::DeltaEngine;
