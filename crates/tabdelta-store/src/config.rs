//! Store configuration
//!
//! Plain serde structs with every field defaulted. How the values are
//! loaded (file, env, flags) is up to the caller.

use serde::Deserialize;

/// SQLite journal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    /// Value for `PRAGMA journal_mode`
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// SQLite synchronous mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    Full,
    Normal,
}

impl SyncMode {
    /// Value for `PRAGMA synchronous`
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Connection settings applied by [`crate::db::configure`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default)]
    pub synchronous: SyncMode,
    /// How long a writer waits on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_foreign_keys() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::default(),
            synchronous: SyncMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
            foreign_keys: default_foreign_keys(),
        }
    }
}

/// Options for physical-table reclamation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct ReclaimOptions {
    /// Also run `VACUUM` after the rebuild to return pages to the OS
    #[serde(default)]
    pub vacuum: bool,
}

impl ReclaimOptions {
    pub fn with_vacuum() -> Self {
        Self { vacuum: true }
    }
}
