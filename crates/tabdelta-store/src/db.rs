//! Database connection management
//!
//! Provides utilities for opening and configuring SQLite connections

#![allow(clippy::result_large_err)]

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Apply connection pragmas from `config`
///
/// In-memory databases silently keep their `memory` journal mode.
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {};", foreign_keys))
        .map_err(from_rusqlite)?;

    conn.execute_batch(&format!(
        "PRAGMA journal_mode = {};",
        config.journal_mode.pragma_value()
    ))
    .map_err(from_rusqlite)?;

    conn.execute_batch(&format!(
        "PRAGMA synchronous = {};",
        config.synchronous.pragma_value()
    ))
    .map_err(from_rusqlite)?;

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(from_rusqlite)?;

    tracing::debug!(
        journal_mode = config.journal_mode.pragma_value(),
        synchronous = config.synchronous.pragma_value(),
        busy_timeout_ms = config.busy_timeout_ms,
        "Configured connection"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JournalMode;

    #[test]
    fn test_configure_file_database_uses_wal() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = open(dir.path().join("store.db")).unwrap();
        configure(&conn, &StoreConfig::default()).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_configure_delete_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = open(dir.path().join("store.db")).unwrap();
        let config = StoreConfig {
            journal_mode: JournalMode::Delete,
            ..StoreConfig::default()
        };
        configure(&conn, &config).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "delete");
    }

    #[test]
    fn test_configure_in_memory() {
        let conn = open_in_memory().unwrap();
        assert!(configure(&conn, &StoreConfig::default()).is_ok());
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
