//! Snapshot codec.
//!
//! A snapshot is the whole record store as one versioned JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "exportedAt": "2026-01-01T00:00:00.000Z",
//!   "sessions": [{"id": "...", "type": "focus", "label": "", "startedAt": 0,
//!                 "completedAt": 0, "duration": 0}],
//!   "tasks": [{"id": "...", "title": "...", "status": "todo",
//!              "pomodorosCompleted": 0, "createdAt": 0, "completedAt": null}]
//! }
//! ```
//!
//! Decoding is all-or-nothing: the first bad record rejects the document.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use super::error::{DecodeError, RecordKind};
use crate::records::{Session, Task};

/// Schema version written by this build and the only one it reads.
pub const SNAPSHOT_VERSION: u64 = 1;

/// A self-contained copy of every session and task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    /// `None` only for decoded documents that omitted the field
    pub exported_at: Option<DateTime<Utc>>,
    pub sessions: Vec<Session>,
    pub tasks: Vec<Task>,
}

impl Snapshot {
    /// Capture the given records, stamped with the current instant.
    #[must_use]
    pub fn new(sessions: Vec<Session>, tasks: Vec<Task>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Some(Utc::now().trunc_subsecs(3)),
            sessions,
            tasks,
        }
    }

    /// `exportedAt` as written on the wire.
    #[must_use]
    pub fn exported_at_string(&self) -> Option<String> {
        self.exported_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Build the wire document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "version": self.version,
            "exportedAt": self.exported_at_string(),
            "sessions": self.sessions.iter().map(session_to_json).collect::<Vec<_>>(),
            "tasks": self.tasks.iter().map(task_to_json).collect::<Vec<_>>(),
        })
    }

    /// Encode to bytes for upload.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Decode and validate a downloaded document.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the bytes are not a JSON object with
    /// `sessions` and `tasks` arrays (or carry an unsupported `version`), and
    /// `InvalidRecord` for the first entry that fails field validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::MalformedPayload(format!("not valid JSON: {e}")))?;

        let Value::Object(mut doc) = value else {
            return Err(DecodeError::MalformedPayload(
                "top level is not an object".to_string(),
            ));
        };

        let version = read_version(&doc)?;
        let exported_at = read_exported_at(&doc)?;
        let raw_sessions = take_array(&mut doc, "sessions")?;
        let raw_tasks = take_array(&mut doc, "tasks")?;

        let sessions = decode_records::<Session>(raw_sessions, RecordKind::Session)?;
        let tasks = decode_records::<Task>(raw_tasks, RecordKind::Task)?;

        Ok(Self {
            version,
            exported_at,
            sessions,
            tasks,
        })
    }
}

fn session_to_json(session: &Session) -> Value {
    json!({
        "id": session.id,
        "type": session.session_type.as_str(),
        "label": session.label,
        "startedAt": session.started_at,
        "completedAt": session.completed_at,
        "duration": session.duration,
    })
}

fn task_to_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "status": task.status.as_str(),
        "pomodorosCompleted": task.pomodoros_completed,
        "createdAt": task.created_at,
        "completedAt": task.completed_at,
    })
}

/// Missing `version` reads as 1; anything else must equal [`SNAPSHOT_VERSION`].
fn read_version(doc: &Map<String, Value>) -> Result<u64, DecodeError> {
    let Some(raw) = doc.get("version") else {
        return Ok(SNAPSHOT_VERSION);
    };
    let version = raw.as_u64().ok_or_else(|| {
        DecodeError::MalformedPayload(format!("`version` must be an integer, got {raw}"))
    })?;
    if version != SNAPSHOT_VERSION {
        return Err(DecodeError::MalformedPayload(format!(
            "unsupported snapshot version {version} (expected {SNAPSHOT_VERSION})"
        )));
    }
    Ok(version)
}

fn read_exported_at(doc: &Map<String, Value>) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match doc.get("exportedAt") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| DecodeError::MalformedPayload(format!("`exportedAt` '{s}': {e}"))),
        Some(other) => Err(DecodeError::MalformedPayload(format!(
            "`exportedAt` must be a timestamp string, got {other}"
        ))),
    }
}

fn take_array(doc: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>, DecodeError> {
    match doc.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DecodeError::MalformedPayload(format!(
            "`{key}` is not an array"
        ))),
        None => Err(DecodeError::MalformedPayload(format!(
            "missing `{key}` array"
        ))),
    }
}

fn decode_records<T: DeserializeOwned>(
    items: Vec<Value>,
    kind: RecordKind,
) -> Result<Vec<T>, DecodeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            // Serde would also accept a positional array for a struct
            if !item.is_object() {
                return Err(DecodeError::InvalidRecord {
                    kind,
                    index,
                    reason: format!("expected an object, got {item}"),
                });
            }
            serde_json::from_value(item).map_err(|e| DecodeError::InvalidRecord {
                kind,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
