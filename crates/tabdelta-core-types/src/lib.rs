//! Core types shared across tabdelta facilities
//!
//! This crate holds the canonical field keys and event names used by the
//! logging facility in `tabdelta-core` and by every crate that emits
//! structured events.

pub mod schema;
