//! Connection-owning facade over the commands.
//!
//! `save` and `reclaim` take `&mut self`, so within one process the borrow
//! checker keeps writers to a single engine serialized. Across processes
//! SQLite's IMMEDIATE / EXCLUSIVE locks do the same.

#![allow(clippy::result_large_err)]

use crate::commands::history::{self, TableStats};
use crate::commands::{rebuild, reclaim, save};
use rusqlite::Connection;
use std::path::Path;
use tabdelta_core::model::{DeltaDescriptor, OwnerRef, RebuiltSnapshot, Snapshot};
use tabdelta_store::errors::Result;
use tabdelta_store::migrations::apply_migrations;
use tabdelta_store::{db, ReclaimOptions, ReclaimReport, StoreConfig};

/// Versioned snapshot store bound to one SQLite database
pub struct DeltaEngine {
    conn: Connection,
}

impl DeltaEngine {
    /// Open (or create) a store file, configure it and apply migrations
    pub fn open<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        let conn = db::open(path)?;
        db::configure(&conn, config)?;
        Self::from_connection(conn)
    }

    /// Fresh in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        db::configure(&conn, &StoreConfig::default())?;
        Self::from_connection(conn)
    }

    /// Wrap an already configured connection, applying migrations
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Save a full snapshot of `table`
    pub fn save(
        &mut self,
        table: &str,
        snapshot: &Snapshot,
        owner: &OwnerRef,
    ) -> Result<DeltaDescriptor> {
        save::save_snapshot(&mut self.conn, table, snapshot, owner)
    }

    pub fn rebuild(&self, descriptor: &DeltaDescriptor) -> Result<RebuiltSnapshot> {
        rebuild::rebuild(&self.conn, descriptor)
    }

    pub fn rebuild_by_id(&self, descriptor_id: &str) -> Result<RebuiltSnapshot> {
        rebuild::rebuild_by_id(&self.conn, descriptor_id)
    }

    pub fn history(&self, table: &str) -> Result<Vec<DeltaDescriptor>> {
        history::history(&self.conn, table)
    }

    pub fn latest(&self, table: &str) -> Result<Option<DeltaDescriptor>> {
        history::latest(&self.conn, table)
    }

    pub fn tables(&self) -> Result<Vec<String>> {
        history::tables(&self.conn)
    }

    pub fn stats(&self, table: &str) -> Result<TableStats> {
        history::stats(&self.conn, table)
    }

    /// Rebuild the physical storage of `table`; never runs implicitly
    pub fn reclaim(&mut self, table: &str, options: ReclaimOptions) -> Result<ReclaimReport> {
        reclaim::reclaim_table(&mut self.conn, table, options)
    }

    /// Underlying connection, for read-only inspection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}
