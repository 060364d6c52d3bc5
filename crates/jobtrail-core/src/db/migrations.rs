//! Table-layout versioning for the record store file.
//!
//! These are structural (DDL) upgrades applied on open. Data migrations over
//! application documents live in [`crate::migrate`].

use super::schema;
use rusqlite::{Connection, types::Type};

/// Latest layout version understood by this binary.
pub const LATEST_LAYOUT_VERSION: u32 = 2;

const LAYOUTS: &[(u32, &str)] = &[(1, schema::LAYOUT_V1_SQL), (2, schema::LAYOUT_V2_SQL)];

/// Read `PRAGMA user_version` and convert it to a Rust `u32`.
///
/// # Errors
///
/// Returns an error if querying SQLite fails or the version value cannot be
/// represented as `u32`.
pub fn current_layout_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Apply all pending layout upgrades in ascending order.
///
/// Each upgrade runs only when its version is above `user_version`, and the
/// DDL itself uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if any upgrade fails.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let mut current = current_layout_version(conn)?;

    for (version, sql) in LAYOUTS {
        if *version <= current {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", i64::from(*version))?;
        tx.execute(
            "UPDATE store_meta SET layout_version = ?1 WHERE id = 1",
            [i64::from(*version)],
        )?;
        tx.commit()?;
        tracing::debug!(version, "applied store layout upgrade");
        current = *version;
    }

    Ok(current)
}
