//! The record store contract and its SQLite implementation.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::EngineError;
use crate::model::{ApplicationRecord, StatusDefinition};

/// Persistent document collection the migrations operate on.
///
/// Every call is awaited to completion before the next one starts; no
/// implementation is expected to coordinate concurrent writers.
pub trait RecordStore {
    /// Every stored application in store-iteration order, decoded one row at
    /// a time. A row that does not decode yields an
    /// [`EngineError::Document`] in its slot instead of failing the scan.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be read.
    fn scan_application_rows(&self)
    -> Result<Vec<Result<ApplicationRecord, EngineError>>, EngineError>;

    /// All application records in store-iteration order.
    ///
    /// # Errors
    ///
    /// Fails on the first row that does not decode.
    fn scan_applications(&self) -> Result<Vec<ApplicationRecord>, EngineError> {
        self.scan_application_rows()?.into_iter().collect()
    }

    /// Replace one stored record with `record` (matched by id).
    fn update_application(&self, record: &ApplicationRecord) -> Result<(), EngineError>;

    /// Insert new records. Returns the number inserted.
    fn insert_applications(&self, records: &[ApplicationRecord]) -> Result<usize, EngineError>;

    /// All status definitions across users.
    fn scan_status_definitions(&self) -> Result<Vec<StatusDefinition>, EngineError>;

    /// Insert status definitions. Returns the number inserted.
    fn insert_status_definitions(&self, defs: &[StatusDefinition]) -> Result<usize, EngineError>;

    /// Delete every status definition whose name is in `names`.
    fn delete_status_definitions_named(&self, names: &[&str]) -> Result<usize, EngineError>;
}

/// Record store backed by a single SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Connect to the store at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connect`] when the file cannot be opened or
    /// upgraded.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let conn = super::open_connection(path).map_err(|source| EngineError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "record store opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// A private in-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        let mut conn = Connection::open_in_memory()?;
        super::migrations::migrate(&mut conn)?;
        Ok(Self { conn, path: None })
    }

    /// File path, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    ///
    /// # Errors
    ///
    /// Returns the close error from SQLite.
    pub fn close(self) -> Result<(), EngineError> {
        self.conn.close().map_err(|(_, err)| EngineError::Store(err))
    }

    pub(crate) const fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn encode(record: &ApplicationRecord) -> Result<String, EngineError> {
    serde_json::to_string(record).map_err(|source| EngineError::Document {
        record_id: record.id.clone(),
        source,
    })
}

impl RecordStore for SqliteStore {
    fn scan_application_rows(
        &self,
    ) -> Result<Vec<Result<ApplicationRecord, EngineError>>, EngineError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document FROM applications ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, document) = row?;
            records.push(
                serde_json::from_str::<ApplicationRecord>(&document).map_err(|source| {
                    EngineError::Document {
                        record_id: id,
                        source,
                    }
                }),
            );
        }
        Ok(records)
    }

    fn update_application(&self, record: &ApplicationRecord) -> Result<(), EngineError> {
        let document = encode(record)?;
        let changed = self.conn.execute(
            "UPDATE applications SET user_id = ?2, document = ?3 WHERE id = ?1",
            params![record.id, record.user_id, document],
        )?;
        if changed == 0 {
            tracing::warn!(record_id = %record.id, "update matched no stored application");
        }
        Ok(())
    }

    fn insert_applications(&self, records: &[ApplicationRecord]) -> Result<usize, EngineError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO applications (id, user_id, document) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                inserted += stmt.execute(params![record.id, record.user_id, encode(record)?])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn scan_status_definitions(&self) -> Result<Vec<StatusDefinition>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, description, is_terminal
             FROM status_definitions ORDER BY rowid",
        )?;
        let defs = stmt
            .query_map([], |row| {
                Ok(StatusDefinition {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    is_terminal: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(defs)
    }

    fn insert_status_definitions(&self, defs: &[StatusDefinition]) -> Result<usize, EngineError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO status_definitions (id, user_id, name, description, is_terminal)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for def in defs {
                inserted += stmt.execute(params![
                    def.id,
                    def.user_id,
                    def.name,
                    def.description,
                    def.is_terminal
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn delete_status_definitions_named(&self, names: &[&str]) -> Result<usize, EngineError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM status_definitions WHERE name = ?1")?;
            for name in names {
                deleted += stmt.execute([name])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }
}
