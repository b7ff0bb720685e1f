//! `SQLite` database connection and operations.
//!
//! The database is stored at `~/.pomotrack/pomotrack.db` unless overridden
//! and contains the `sessions` and `kanban_tasks` tables.

use std::time::Duration;

use rusqlite::{Connection, Transaction};

use crate::config::Paths;
use crate::error::PomotrackError;

use super::migrations;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, PomotrackError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// Creates the database file (and its parent directory) and runs
    /// migrations if necessary. File databases use WAL journaling so readers
    /// on other connections keep seeing committed state during a write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, PomotrackError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PomotrackError::Config(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            PomotrackError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| PomotrackError::Database(format!("Failed to enable WAL: {e}")))?;

        tracing::debug!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, PomotrackError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PomotrackError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, PomotrackError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| PomotrackError::Database(format!("Failed to set busy timeout: {e}")))?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Run database migrations.
    fn migrate(&self) -> Result<(), PomotrackError> {
        migrations::run(&self.conn)
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, PomotrackError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction. Dropping it without commit rolls back.
    ///
    /// # Errors
    ///
    /// Returns an error if `BEGIN` fails (e.g. the database is locked).
    pub fn transaction(&mut self) -> Result<Transaction<'_>, PomotrackError> {
        self.conn
            .transaction()
            .map_err(|e| PomotrackError::Database(format!("Failed to begin transaction: {e}")))
    }
}
