//! Database schema definitions.
//!
//! The schema is applied idempotently every time a SQLite store is opened.

use rusqlite::{Connection, Result};

/// Current schema version, recorded in `schema_migrations`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the events database.
///
/// Note: `start_time`, `end_time` and `notify_period` are INTEGER nanoseconds
/// (Unix epoch for timestamps). Ordering on `start_time` is numeric and
/// values round-trip exactly.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    notify_period INTEGER NOT NULL DEFAULT 0 CHECK (notify_period >= 0)
);

CREATE INDEX IF NOT EXISTS idx_events_start_time ON events(start_time);
CREATE INDEX IF NOT EXISTS idx_events_user_start ON events(user_id, start_time);
";

/// Apply the schema to a database connection.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}
