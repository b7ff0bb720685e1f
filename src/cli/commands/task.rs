//! Kanban task command implementation.

use crate::cli::args::{OutputFormat, TaskCommands};
use crate::error::PomotrackError;
use crate::output::{format_task, format_tasks, to_json};
use crate::records::{SqliteStore, Task, TaskStatus};

/// Execute task subcommands.
///
/// # Errors
///
/// Returns an error if input is invalid, the task does not exist, the store
/// fails, or output formatting fails.
pub fn task(
    store: &SqliteStore,
    cmd: TaskCommands,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    match cmd {
        TaskCommands::Add { title } => {
            if title.trim().is_empty() {
                return Err(PomotrackError::InvalidInput(
                    "Task title cannot be empty".to_string(),
                ));
            }
            let task = Task::new(&title);
            store.create_task(&task)?;
            match format {
                OutputFormat::Json => to_json(&task),
                OutputFormat::Pretty => Ok(format!("Created task: {} (ID: {})", task.title, task.id)),
            }
        }

        TaskCommands::List { status } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let tasks = store.list_tasks(status)?;
            format_tasks(&tasks, format)
        }

        TaskCommands::Move { id, status } => {
            let status = parse_status(&status)?;
            let task = store.move_task(&id, status)?;
            tracing::debug!(id = %task.id, status = %task.status, "moved task");
            format_task(&task, format)
        }

        TaskCommands::Pomodoro { id } => {
            let task = store.increment_pomodoros(id.as_deref())?;
            format_task(&task, format)
        }

        TaskCommands::Delete { id } => {
            if !store.delete_task(&id)? {
                return Err(PomotrackError::NotFound(format!("task {id}")));
            }
            match format {
                OutputFormat::Json => to_json(&serde_json::json!({ "ok": true, "deleted": id })),
                OutputFormat::Pretty => Ok(format!("Deleted task: {id}")),
            }
        }

        TaskCommands::Clear { done, force } => {
            if !force {
                let what = if done { "all done tasks" } else { "every task" };
                return Err(PomotrackError::InvalidInput(format!(
                    "This will delete {what}.\nUse --force to confirm."
                )));
            }
            let deleted = if done {
                store.clear_done_tasks()?
            } else {
                store.delete_all_tasks()?
            };
            match format {
                OutputFormat::Json => to_json(&serde_json::json!({ "deleted": deleted })),
                OutputFormat::Pretty => Ok(format!("Deleted {deleted} tasks.")),
            }
        }
    }
}

fn parse_status(s: &str) -> Result<TaskStatus, PomotrackError> {
    TaskStatus::parse(s).ok_or_else(|| {
        PomotrackError::InvalidInput(format!(
            "Unknown status '{s}' (expected todo, in-progress or done)"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn create_test_store() -> SqliteStore {
        SqliteStore::with_database(Database::open_in_memory().unwrap())
    }

    fn add(store: &SqliteStore, title: &str) -> String {
        let output = task(
            store,
            TaskCommands::Add {
                title: title.to_string(),
            },
            OutputFormat::Json,
        )
        .unwrap();
        let parsed: Task = serde_json::from_str(&output).unwrap();
        parsed.id
    }

    fn mv(store: &SqliteStore, id: &str, status: &str) -> Result<String, PomotrackError> {
        task(
            store,
            TaskCommands::Move {
                id: id.to_string(),
                status: status.to_string(),
            },
            OutputFormat::Json,
        )
    }

    #[test]
    fn test_add_and_list() {
        let store = create_test_store();
        let id = add(&store, "Write chapter");
        assert!(id.starts_with("task-"));

        let output = task(&store, TaskCommands::List { status: None }, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["items"][0]["status"], "todo");
    }

    #[test]
    fn test_add_rejects_blank_title() {
        let store = create_test_store();
        let err = task(
            &store,
            TaskCommands::Add {
                title: "   ".to_string(),
            },
            OutputFormat::Pretty,
        )
        .unwrap_err();
        assert!(matches!(err, PomotrackError::InvalidInput(_)));
    }

    #[test]
    fn test_move_and_filter_by_status() {
        let store = create_test_store();
        let first = add(&store, "first");
        let second = add(&store, "second");

        mv(&store, &first, "in-progress").unwrap();
        mv(&store, &second, "in-progress").unwrap();

        let output = task(
            &store,
            TaskCommands::List {
                status: Some("in-progress".to_string()),
            },
            OutputFormat::Json,
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["items"][0]["id"], second.as_str());
    }

    #[test]
    fn test_move_rejects_unknown_status() {
        let store = create_test_store();
        let id = add(&store, "first");
        assert!(matches!(
            mv(&store, &id, "blocked"),
            Err(PomotrackError::InvalidInput(_))
        ));
        assert!(matches!(
            mv(&store, "task-missing", "done"),
            Err(PomotrackError::NotFound(_))
        ));
    }

    #[test]
    fn test_pomodoro_defaults_to_active_task() {
        let store = create_test_store();
        let id = add(&store, "focus on me");

        assert!(task(&store, TaskCommands::Pomodoro { id: None }, OutputFormat::Json).is_err());

        mv(&store, &id, "in-progress").unwrap();
        let output = task(&store, TaskCommands::Pomodoro { id: None }, OutputFormat::Json).unwrap();
        let parsed: Task = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.pomodoros_completed, 1);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = create_test_store();
        let err = task(
            &store,
            TaskCommands::Delete {
                id: "task-nope".to_string(),
            },
            OutputFormat::Pretty,
        )
        .unwrap_err();
        assert!(matches!(err, PomotrackError::NotFound(_)));
    }

    #[test]
    fn test_clear_done_only() {
        let store = create_test_store();
        let shipped = add(&store, "shipped");
        add(&store, "pending");
        mv(&store, &shipped, "done").unwrap();

        assert!(task(
            &store,
            TaskCommands::Clear {
                done: true,
                force: false
            },
            OutputFormat::Pretty
        )
        .is_err());

        task(
            &store,
            TaskCommands::Clear {
                done: true,
                force: true,
            },
            OutputFormat::Pretty,
        )
        .unwrap();

        let remaining = store.list_tasks(None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "pending");
    }
}
