//! Kanban task records.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses in board order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Parse a status, accepting the wire name and short aliases.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "t" => Some(Self::Todo),
            "in-progress" | "in_progress" | "doing" | "active" | "wip" => Some(Self::InProgress),
            "done" | "d" => Some(Self::Done),
            _ => None,
        }
    }

    /// Name used on the wire and in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique key
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub pomodoros_completed: u32,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds, `null` on the wire when absent
    #[serde(default)]
    pub completed_at: Option<i64>,
}

impl Task {
    /// Create a new task in the todo column.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            id: new_task_id(),
            title: title.trim().to_string(),
            status: TaskStatus::Todo,
            pomodoros_completed: 0,
            created_at: Utc::now().timestamp_millis(),
            completed_at: None,
        }
    }

    /// Move the task to `status`, stamping `completed_at` when it lands in done.
    pub fn move_to(&mut self, status: TaskStatus) {
        self.status = status;
        self.completed_at = if status == TaskStatus::Done {
            Some(Utc::now().timestamp_millis())
        } else {
            None
        };
    }
}

/// Generate a fresh task id.
#[must_use]
pub fn new_task_id() -> String {
    format!("task-{}", uuid::Uuid::new_v4())
}
