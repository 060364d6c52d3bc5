//! SQLite-backed record store.
//!
//! One file holds the application documents, the status definitions and the
//! migration ledger, so a unit's document writes and its ledger entry land in
//! the same database. The journal runs in WAL mode so `jt validate` or
//! `jt status` can read while a unit holds its write transaction.

pub mod migrations;
pub mod schema;
pub mod store;

pub use store::{RecordStore, SqliteStore};

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// How long a connection waits on a competing writer before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the store file, creating it and its directory on first use, and
/// upgrade its table layout.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the file cannot be
/// opened as SQLite, or the layout upgrade fails.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open store database {}", path.display()))?;

    configure_connection(&conn).context("configure store connection")?;
    migrations::migrate(&mut conn).context("upgrade store layout")?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
}
