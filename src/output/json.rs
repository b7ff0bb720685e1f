//! JSON output formatting.
//!
//! Records are emitted with the same field names as the sync snapshot.

use serde::Serialize;
use serde_json::json;

use crate::error::PomotrackError;
use crate::records::{Session, Task};

/// Format sessions as JSON
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_sessions_json(sessions: &[Session]) -> Result<String, PomotrackError> {
    let output = json!({
        "count": sessions.len(),
        "items": sessions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format tasks as JSON
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_tasks_json(tasks: &[Task]) -> Result<String, PomotrackError> {
    let output = json!({
        "count": tasks.len(),
        "items": tasks
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format a push or pull report with an `ok` flag
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_report_json<T: Serialize>(report: &T) -> Result<String, PomotrackError> {
    let mut value = serde_json::to_value(report)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("ok".to_string(), json!(true));
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Format any serializable value as pretty JSON
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PomotrackError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{SessionType, TaskStatus};
    use crate::sync::PullReport;

    fn make_task(title: &str) -> Task {
        Task {
            id: "task-1".to_string(),
            title: title.to_string(),
            status: TaskStatus::InProgress,
            pomodoros_completed: 3,
            created_at: 1_700_000_000_000,
            completed_at: None,
        }
    }

    #[test]
    fn test_format_sessions_json_empty_list() {
        let result = format_sessions_json(&[]).unwrap();

        assert!(result.contains("\"count\": 0"));
        assert!(result.contains("\"items\": []"));
    }

    #[test]
    fn test_format_sessions_json_uses_wire_names() {
        let session = Session {
            id: "s1".to_string(),
            session_type: SessionType::ShortBreak,
            label: String::new(),
            started_at: 1,
            completed_at: 2,
            duration: 300,
        };
        let result = format_sessions_json(&[session]).unwrap();

        assert!(result.contains("\"type\": \"short-break\""));
        assert!(result.contains("\"startedAt\": 1"));
        assert!(result.contains("\"completedAt\": 2"));
    }

    #[test]
    fn test_format_tasks_json() {
        let result = format_tasks_json(&[make_task("Write tests")]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["items"][0]["title"], "Write tests");
        assert_eq!(parsed["items"][0]["status"], "in-progress");
        assert_eq!(parsed["items"][0]["pomodorosCompleted"], 3);
    }

    #[test]
    fn test_format_report_json_adds_ok() {
        let report = PullReport {
            imported_sessions: 2,
            imported_tasks: 5,
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&format_report_json(&report).unwrap()).unwrap();

        assert_eq!(parsed["ok"], true);
        assert_eq!(parsed["importedSessions"], 2);
        assert_eq!(parsed["importedTasks"], 5);
    }

    #[test]
    fn test_to_json_preserves_special_characters() {
        let result = to_json(&make_task("Quote \"this\" & <that>")).unwrap();
        let parsed: Task = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed.title, "Quote \"this\" & <that>");
    }
}
