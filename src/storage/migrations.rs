//! Database migrations for pomotrack.
//!
//! Each migration is a function that upgrades the schema by one version.
//! Migrations are run automatically when the database is opened.

use rusqlite::Connection;

use crate::error::PomotrackError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, PomotrackError> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| PomotrackError::Database(format!("Failed to get schema version: {e}")))?;

    Ok(version)
}

/// Set the schema version in the database.
fn set_version(conn: &Connection, version: i32) -> Result<(), PomotrackError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| PomotrackError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), PomotrackError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        tracing::debug!(version, "applying schema migration");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

/// Run a specific migration.
fn run_migration(conn: &Connection, version: i32) -> Result<(), PomotrackError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(PomotrackError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: Initial schema.
///
/// Creates tables for:
/// - `sessions`: completed focus and break sessions
/// - `kanban_tasks`: the task board
fn migrate_v1(conn: &Connection) -> Result<(), PomotrackError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY NOT NULL,
            type TEXT NOT NULL,
            label TEXT NOT NULL DEFAULT '',
            started_at INTEGER NOT NULL,
            completed_at INTEGER NOT NULL,
            duration INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_started
        ON sessions(started_at);

        CREATE TABLE IF NOT EXISTS kanban_tasks (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            pomodoros_completed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            completed_at INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_kanban_tasks_status
        ON kanban_tasks(status);
        ",
    )
    .map_err(|e| PomotrackError::Database(format!("Migration v1 failed: {e}")))
}
