//! SQLite layout for the jobtrail record store.
//!
//! - `applications` holds one JSON document per application; `user_id` is
//!   duplicated out of the document for per-user lookups
//! - `status_definitions` holds each user's workflow stages
//! - `migration_ledger` records which data migrations completed
//! - `store_meta` tracks the layout version and creation time

/// Layout v1: document table, status definitions, and store metadata.
pub const LAYOUT_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS applications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    document TEXT NOT NULL CHECK (json_valid(document))
);

CREATE TABLE IF NOT EXISTS status_definitions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT NOT NULL DEFAULT '',
    is_terminal INTEGER NOT NULL DEFAULT 0 CHECK (is_terminal IN (0, 1)),
    UNIQUE (user_id, name)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    layout_version INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

INSERT OR IGNORE INTO store_meta (id, layout_version) VALUES (1, 1);
";

/// Layout v2: migration ledger and per-user lookup index.
pub const LAYOUT_V2_SQL: &str = r"
CREATE TABLE IF NOT EXISTS migration_ledger (
    migration_id TEXT PRIMARY KEY,
    run_at TEXT NOT NULL,
    success INTEGER NOT NULL CHECK (success IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_applications_user
    ON applications(user_id);
";

/// Tables every opened store must contain.
pub const REQUIRED_TABLES: &[&str] = &[
    "applications",
    "status_definitions",
    "store_meta",
    "migration_ledger",
];
