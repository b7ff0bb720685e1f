//! Record store for sessions and tasks.
//!
//! [`RecordStore`] is the narrow contract the sync engine needs; [`SqliteStore`]
//! implements it and the everyday CRUD operations on top of [`Database`].

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::session::{Session, SessionType};
use super::task::{Task, TaskStatus};
use crate::error::PomotrackError;
use crate::storage::Database;

/// Whole-collection access used by push and pull.
pub trait RecordStore: Send + Sync {
    /// Read every session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_all_sessions(&self) -> Result<Vec<Session>, PomotrackError>;

    /// Read every task.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_all_tasks(&self) -> Result<Vec<Task>, PomotrackError>;

    /// Read both collections as one cohesive state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_all(&self) -> Result<(Vec<Session>, Vec<Task>), PomotrackError> {
        Ok((self.read_all_sessions()?, self.read_all_tasks()?))
    }

    /// Atomically replace both collections.
    ///
    /// Concurrent readers observe either the old or the new contents, never a
    /// mix and never an empty gap. On error the old contents are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be applied.
    fn replace_all(&self, sessions: &[Session], tasks: &[Task]) -> Result<(), PomotrackError>;
}

/// Today's (or any window's) session summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub focus_count: usize,
    pub break_count: usize,
    pub total_focus_minutes: i64,
    /// Focus sessions per label, in order of most recent appearance
    pub label_breakdown: Vec<LabelCount>,
}

/// Number of focus sessions recorded under one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

const SESSION_COLUMNS: &str = "id, type, label, started_at, completed_at, duration";
const TASK_COLUMNS: &str = "id, title, status, pomodoros_completed, created_at, completed_at";

/// `SQLite`-backed store.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Open the store at the default database location.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn new() -> Result<Self, PomotrackError> {
        Ok(Self::with_database(Database::open()?))
    }

    /// Create a store with an existing database connection.
    #[must_use]
    pub fn with_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    // ==================== Sessions ====================

    /// List sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<Session>, PomotrackError> {
        let db = self.db.lock();
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY started_at DESC, id LIMIT ?1"
        );
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        query_sessions(db.connection(), &sql, params![limit])
    }

    /// Insert a session or overwrite the one with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert_session(&self, session: &Session) -> Result<(), PomotrackError> {
        let db = self.db.lock();
        upsert_session(db.connection(), session)
    }

    /// Upsert a batch of sessions in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is stored in that case.
    pub fn upsert_sessions(&self, sessions: &[Session]) -> Result<usize, PomotrackError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;
        for session in sessions {
            upsert_session(&tx, session)?;
        }
        tx.commit()
            .map_err(|e| PomotrackError::Database(format!("Failed to commit sessions: {e}")))?;
        Ok(sessions.len())
    }

    /// Delete every session.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_all_sessions(&self) -> Result<usize, PomotrackError> {
        let db = self.db.lock();
        db.connection()
            .execute("DELETE FROM sessions", [])
            .map_err(|e| PomotrackError::Database(format!("Failed to delete sessions: {e}")))
    }

    /// Summarise sessions completed at or after `since` (epoch milliseconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn session_stats(&self, since: i64) -> Result<SessionStats, PomotrackError> {
        let sessions = {
            let db = self.db.lock();
            let sql = format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE completed_at >= ?1
                 ORDER BY completed_at DESC"
            );
            query_sessions(db.connection(), &sql, params![since])?
        };

        let mut stats = SessionStats::default();
        let mut focus_seconds = 0;

        for session in &sessions {
            if session.session_type.is_break() {
                stats.break_count += 1;
                continue;
            }
            stats.focus_count += 1;
            focus_seconds += session.duration;

            let label = session.display_label();
            match stats.label_breakdown.iter_mut().find(|l| l.label == label) {
                Some(entry) => entry.count += 1,
                None => stats.label_breakdown.push(LabelCount {
                    label: label.to_string(),
                    count: 1,
                }),
            }
        }

        stats.total_focus_minutes = (focus_seconds + 30).div_euclid(60);
        Ok(stats)
    }

    // ==================== Tasks ====================

    /// List tasks in creation order, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, PomotrackError> {
        let db = self.db.lock();
        match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {TASK_COLUMNS} FROM kanban_tasks WHERE status = ?1
                     ORDER BY created_at ASC, id"
                );
                query_tasks(db.connection(), &sql, params![status.as_str()])
            }
            None => {
                let sql =
                    format!("SELECT {TASK_COLUMNS} FROM kanban_tasks ORDER BY created_at ASC, id");
                query_tasks(db.connection(), &sql, [])
            }
        }
    }

    /// Get a task by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>, PomotrackError> {
        let db = self.db.lock();
        get_task(db.connection(), id)
    }

    /// Insert a task or overwrite the one with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn create_task(&self, task: &Task) -> Result<(), PomotrackError> {
        let db = self.db.lock();
        upsert_task(db.connection(), task)
    }

    /// Overwrite an existing task.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no task has this id.
    pub fn update_task(&self, task: &Task) -> Result<(), PomotrackError> {
        let db = self.db.lock();
        let rows = db
            .connection()
            .execute(
                r"UPDATE kanban_tasks SET
                  title = ?1,
                  status = ?2,
                  pomodoros_completed = ?3,
                  created_at = ?4,
                  completed_at = ?5
                  WHERE id = ?6",
                params![
                    task.title,
                    task.status.as_str(),
                    task.pomodoros_completed,
                    task.created_at,
                    task.completed_at,
                    task.id,
                ],
            )
            .map_err(|e| PomotrackError::Database(format!("Failed to update task: {e}")))?;

        if rows == 0 {
            return Err(PomotrackError::NotFound(format!("task {}", task.id)));
        }
        Ok(())
    }

    /// Move a task to another column.
    ///
    /// Only one task may be in progress: moving a task there sends the
    /// previous one back to todo.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no task has this id.
    pub fn move_task(&self, id: &str, status: TaskStatus) -> Result<Task, PomotrackError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;

        let mut task =
            get_task(&tx, id)?.ok_or_else(|| PomotrackError::NotFound(format!("task {id}")))?;

        if status == TaskStatus::InProgress {
            tx.execute(
                "UPDATE kanban_tasks SET status = 'todo' WHERE status = 'in-progress' AND id != ?1",
                [id],
            )
            .map_err(|e| PomotrackError::Database(format!("Failed to demote active task: {e}")))?;
        }

        task.move_to(status);
        upsert_task(&tx, &task)?;

        tx.commit()
            .map_err(|e| PomotrackError::Database(format!("Failed to commit move: {e}")))?;
        Ok(task)
    }

    /// Count a finished pomodoro against a task, or the in-progress task when
    /// `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the task does not exist or nothing is in progress.
    pub fn increment_pomodoros(&self, id: Option<&str>) -> Result<Task, PomotrackError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;

        let task = match id {
            Some(id) => get_task(&tx, id)?
                .ok_or_else(|| PomotrackError::NotFound(format!("task {id}")))?,
            None => {
                let sql = format!(
                    "SELECT {TASK_COLUMNS} FROM kanban_tasks WHERE status = 'in-progress' LIMIT 1"
                );
                query_tasks(&tx, &sql, [])?
                    .into_iter()
                    .next()
                    .ok_or_else(|| PomotrackError::NotFound("task in progress".to_string()))?
            }
        };

        let task = Task {
            pomodoros_completed: task.pomodoros_completed.saturating_add(1),
            ..task
        };
        upsert_task(&tx, &task)?;

        tx.commit()
            .map_err(|e| PomotrackError::Database(format!("Failed to commit pomodoro: {e}")))?;
        Ok(task)
    }

    /// Delete a task. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_task(&self, id: &str) -> Result<bool, PomotrackError> {
        let db = self.db.lock();
        let rows = db
            .connection()
            .execute("DELETE FROM kanban_tasks WHERE id = ?1", [id])
            .map_err(|e| PomotrackError::Database(format!("Failed to delete task: {e}")))?;
        Ok(rows > 0)
    }

    /// Delete every task.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_all_tasks(&self) -> Result<usize, PomotrackError> {
        let db = self.db.lock();
        db.connection()
            .execute("DELETE FROM kanban_tasks", [])
            .map_err(|e| PomotrackError::Database(format!("Failed to delete tasks: {e}")))
    }

    /// Delete tasks in the done column.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear_done_tasks(&self) -> Result<usize, PomotrackError> {
        let db = self.db.lock();
        db.connection()
            .execute("DELETE FROM kanban_tasks WHERE status = 'done'", [])
            .map_err(|e| PomotrackError::Database(format!("Failed to clear done tasks: {e}")))
    }
}

impl RecordStore for SqliteStore {
    fn read_all_sessions(&self) -> Result<Vec<Session>, PomotrackError> {
        self.list_sessions(None)
    }

    fn read_all_tasks(&self) -> Result<Vec<Task>, PomotrackError> {
        self.list_tasks(None)
    }

    fn read_all(&self) -> Result<(Vec<Session>, Vec<Task>), PomotrackError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;

        let sessions = query_sessions(
            &tx,
            &format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY started_at DESC, id"),
            [],
        )?;
        let tasks = query_tasks(
            &tx,
            &format!("SELECT {TASK_COLUMNS} FROM kanban_tasks ORDER BY created_at ASC, id"),
            [],
        )?;

        tx.finish()
            .map_err(|e| PomotrackError::Database(format!("Failed to end read: {e}")))?;
        Ok((sessions, tasks))
    }

    fn replace_all(&self, sessions: &[Session], tasks: &[Task]) -> Result<(), PomotrackError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;

        tx.execute("DELETE FROM sessions", [])
            .map_err(|e| PomotrackError::Database(format!("Failed to clear sessions: {e}")))?;
        tx.execute("DELETE FROM kanban_tasks", [])
            .map_err(|e| PomotrackError::Database(format!("Failed to clear tasks: {e}")))?;

        for session in sessions {
            upsert_session(&tx, session)?;
        }
        for task in tasks {
            upsert_task(&tx, task)?;
        }

        tx.commit()
            .map_err(|e| PomotrackError::Database(format!("Failed to commit replace: {e}")))?;

        tracing::info!(
            sessions = sessions.len(),
            tasks = tasks.len(),
            "replaced local records"
        );
        Ok(())
    }
}

fn upsert_session(conn: &Connection, session: &Session) -> Result<(), PomotrackError> {
    conn.execute(
        r"INSERT INTO sessions (id, type, label, started_at, completed_at, duration)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6)
          ON CONFLICT(id) DO UPDATE SET
            type = excluded.type,
            label = excluded.label,
            started_at = excluded.started_at,
            completed_at = excluded.completed_at,
            duration = excluded.duration",
        params![
            session.id,
            session.session_type.as_str(),
            session.label,
            session.started_at,
            session.completed_at,
            session.duration,
        ],
    )
    .map_err(|e| PomotrackError::Database(format!("Failed to upsert session {}: {e}", session.id)))?;
    Ok(())
}

fn upsert_task(conn: &Connection, task: &Task) -> Result<(), PomotrackError> {
    conn.execute(
        r"INSERT INTO kanban_tasks
          (id, title, status, pomodoros_completed, created_at, completed_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6)
          ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            status = excluded.status,
            pomodoros_completed = excluded.pomodoros_completed,
            created_at = excluded.created_at,
            completed_at = excluded.completed_at",
        params![
            task.id,
            task.title,
            task.status.as_str(),
            task.pomodoros_completed,
            task.created_at,
            task.completed_at,
        ],
    )
    .map_err(|e| PomotrackError::Database(format!("Failed to upsert task {}: {e}", task.id)))?;
    Ok(())
}

fn get_task(conn: &Connection, id: &str) -> Result<Option<Task>, PomotrackError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM kanban_tasks WHERE id = ?1");
    conn.query_row(&sql, [id], row_to_task)
        .optional()
        .map_err(|e| PomotrackError::Database(format!("Failed to query task: {e}")))
}

fn query_sessions<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Session>, PomotrackError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| PomotrackError::Database(format!("Failed to prepare query: {e}")))?;

    let rows = stmt
        .query_map(params, row_to_session)
        .map_err(|e| PomotrackError::Database(format!("Failed to query sessions: {e}")))?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row.map_err(|e| PomotrackError::Database(e.to_string()))?);
    }
    Ok(sessions)
}

fn query_tasks<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Task>, PomotrackError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| PomotrackError::Database(format!("Failed to prepare query: {e}")))?;

    let rows = stmt
        .query_map(params, row_to_task)
        .map_err(|e| PomotrackError::Database(format!("Failed to query tasks: {e}")))?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row.map_err(|e| PomotrackError::Database(e.to_string()))?);
    }
    Ok(tasks)
}

/// Convert a database row to a `Session`.
fn row_to_session(row: &Row<'_>) -> Result<Session, rusqlite::Error> {
    let type_str: String = row.get(1)?;
    let session_type = SessionType::parse(&type_str)
        .ok_or_else(|| unknown_value(1, "session type", &type_str))?;

    Ok(Session {
        id: row.get(0)?,
        session_type,
        label: row.get(2)?,
        started_at: row.get(3)?,
        completed_at: row.get(4)?,
        duration: row.get(5)?,
    })
}

/// Convert a database row to a `Task`.
fn row_to_task(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    let status_str: String = row.get(2)?;
    let status =
        TaskStatus::parse(&status_str).ok_or_else(|| unknown_value(2, "task status", &status_str))?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        status,
        pomodoros_completed: row.get(3)?,
        created_at: row.get(4)?,
        completed_at: row.get(5)?,
    })
}

fn unknown_value(column: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        Box::new(PomotrackError::Database(format!("unknown {what} '{value}'"))),
    )
}
