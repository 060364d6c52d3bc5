//! Migration ledger: the record of which migrations completed.
//!
//! An entry's presence is the only signal that a migration has run. Entries
//! are inserted or deleted, never updated.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;

use crate::db::SqliteStore;
use crate::error::EngineError;

/// One completed migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub migration_id: String,
    pub run_at: DateTime<Utc>,
    pub success: bool,
}

/// Repository over ledger entries.
pub trait Ledger {
    /// Whether a successful entry exists for `migration_id`.
    fn has_run(&self, migration_id: &str) -> Result<bool, EngineError>;

    /// Record `migration_id` as completed. An existing entry is left as is.
    fn mark_run(&self, migration_id: &str, run_at: DateTime<Utc>) -> Result<(), EngineError>;

    /// Remove the entry for `migration_id`. Returns whether one existed.
    fn unmark(&self, migration_id: &str) -> Result<bool, EngineError>;

    /// Every entry, ordered by migration id.
    fn entries(&self) -> Result<Vec<LedgerEntry>, EngineError>;
}

/// In-process ledger for tests and scratch runs.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RefCell<BTreeMap<String, LedgerEntry>>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Ledger for MemoryLedger {
    fn has_run(&self, migration_id: &str) -> Result<bool, EngineError> {
        Ok(self
            .entries
            .borrow()
            .get(migration_id)
            .is_some_and(|entry| entry.success))
    }

    fn mark_run(&self, migration_id: &str, run_at: DateTime<Utc>) -> Result<(), EngineError> {
        self.entries
            .borrow_mut()
            .entry(migration_id.to_string())
            .or_insert_with(|| LedgerEntry {
                migration_id: migration_id.to_string(),
                run_at,
                success: true,
            });
        Ok(())
    }

    fn unmark(&self, migration_id: &str) -> Result<bool, EngineError> {
        Ok(self.entries.borrow_mut().remove(migration_id).is_some())
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>, EngineError> {
        Ok(self.entries.borrow().values().cloned().collect())
    }
}

impl Ledger for SqliteStore {
    fn has_run(&self, migration_id: &str) -> Result<bool, EngineError> {
        let success: Option<bool> = self
            .connection()
            .query_row(
                "SELECT success FROM migration_ledger WHERE migration_id = ?1",
                [migration_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(success.unwrap_or(false))
    }

    fn mark_run(&self, migration_id: &str, run_at: DateTime<Utc>) -> Result<(), EngineError> {
        self.connection().execute(
            "INSERT OR IGNORE INTO migration_ledger (migration_id, run_at, success)
             VALUES (?1, ?2, 1)",
            params![
                migration_id,
                run_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ],
        )?;
        Ok(())
    }

    fn unmark(&self, migration_id: &str) -> Result<bool, EngineError> {
        let deleted = self.connection().execute(
            "DELETE FROM migration_ledger WHERE migration_id = ?1",
            [migration_id],
        )?;
        Ok(deleted > 0)
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>, EngineError> {
        let mut stmt = self.connection().prepare(
            "SELECT migration_id, run_at, success FROM migration_ledger ORDER BY migration_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (migration_id, run_at, success) = row?;
            let run_at = DateTime::parse_from_rfc3339(&run_at)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|err| {
                    EngineError::Store(rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(err),
                    ))
                })?;
            entries.push(LedgerEntry {
                migration_id,
                run_at,
                success,
            });
        }
        Ok(entries)
    }
}
