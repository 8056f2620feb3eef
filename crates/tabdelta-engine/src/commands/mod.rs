//! Command orchestration layer.
//!
//! Each command is a free function over a `rusqlite::Connection`; the
//! [`crate::DeltaEngine`] wrapper owns a connection and forwards to them.

pub mod history;
pub mod rebuild;
pub mod reclaim;
pub mod save;
