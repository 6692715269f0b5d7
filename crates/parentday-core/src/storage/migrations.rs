//! Database schema migrations for parentday.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);
    debug!(current_version, target = SCHEMA_VERSION, "checking schema");

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: tickets, settings singleton, registrations.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tickets (
            id                        TEXT PRIMARY KEY,
            number                    INTEGER NOT NULL UNIQUE,
            student_name              TEXT NOT NULL,
            parent_name               TEXT NOT NULL,
            status                    TEXT NOT NULL,
            joined_at                 TEXT,
            order_time                TEXT,
            started_at                TEXT,
            is_paused                 INTEGER NOT NULL DEFAULT 0,
            pause_start_time          TEXT,
            accumulated_pause_seconds REAL NOT NULL DEFAULT 0,
            completed_at              TEXT,
            duration_seconds          INTEGER
        );

        CREATE TABLE IF NOT EXISTS settings (
            id                   INTEGER PRIMARY KEY CHECK (id = 1),
            is_booking_enabled   INTEGER NOT NULL,
            booking_start_time   TEXT,
            interview_start_time TEXT
        );

        CREATE TABLE IF NOT EXISTS registrations (
            id           TEXT PRIMARY KEY,
            parent_name  TEXT NOT NULL,
            student_name TEXT NOT NULL,
            suggestions  TEXT NOT NULL DEFAULT '',
            questions    TEXT NOT NULL DEFAULT '',
            submitted_at TEXT NOT NULL
        );",
    )?;
    set_schema_version(conn, 1)?;
    debug!("applied migration v1");
    Ok(())
}

/// Migration v2: indexes for status lookups and registration history.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
         CREATE INDEX IF NOT EXISTS idx_tickets_student ON tickets(student_name);
         CREATE INDEX IF NOT EXISTS idx_registrations_submitted_at ON registrations(submitted_at);",
    )?;
    set_schema_version(conn, 2)?;
    debug!("applied migration v2");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('tickets', 'settings', 'registrations')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
