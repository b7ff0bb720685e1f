//! Session command implementation.

use std::path::Path;

use chrono::{Local, NaiveTime};

use crate::cli::args::{OutputFormat, SessionCommands};
use crate::error::PomotrackError;
use crate::output::{format_session, format_sessions, format_stats, to_json};
use crate::records::session::new_session_id;
use crate::records::{parse_duration_secs, Session, SessionType, SqliteStore};

/// Execute session subcommands.
///
/// # Errors
///
/// Returns an error if input is invalid, the store fails, or output
/// formatting fails.
pub fn session(
    store: &SqliteStore,
    cmd: SessionCommands,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    match cmd {
        SessionCommands::Add {
            session_type,
            label,
            duration,
            started_at,
        } => add_session(
            store,
            &session_type,
            label.as_deref().unwrap_or_default(),
            duration.as_deref(),
            started_at,
            format,
        ),

        SessionCommands::List { limit } => {
            let sessions = store.list_sessions(Some(limit))?;
            format_sessions(&sessions, format)
        }

        SessionCommands::Stats { all } => {
            let (since, scope) = if all {
                (0, "all time")
            } else {
                (start_of_today_millis(), "today")
            };
            let stats = store.session_stats(since)?;
            format_stats(&stats, scope, format)
        }

        SessionCommands::Import { file } => import_sessions(store, &file, format),

        SessionCommands::Clear { force } => {
            if !force {
                return Err(PomotrackError::InvalidInput(
                    "This will delete all session history.\nUse --force to confirm.".to_string(),
                ));
            }
            let deleted = store.delete_all_sessions()?;
            match format {
                OutputFormat::Json => to_json(&serde_json::json!({ "deleted": deleted })),
                OutputFormat::Pretty => Ok(format!("Deleted {deleted} sessions.")),
            }
        }
    }
}

fn add_session(
    store: &SqliteStore,
    session_type: &str,
    label: &str,
    duration: Option<&str>,
    started_at: Option<i64>,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    let session_type = SessionType::parse(session_type).ok_or_else(|| {
        PomotrackError::InvalidInput(format!(
            "Unknown session type '{session_type}' (expected focus, short-break or long-break)"
        ))
    })?;

    let duration = match duration {
        Some(d) => parse_duration_secs(d).ok_or_else(|| {
            PomotrackError::InvalidInput(format!("Invalid duration '{d}' (try 25m or 1500)"))
        })?,
        None => session_type.default_duration().num_seconds(),
    };

    let session = match started_at {
        Some(started_at) => duration
            .checked_mul(1000)
            .and_then(|millis| started_at.checked_add(millis))
            .map(|completed_at| Session {
                id: new_session_id(),
                session_type,
                label: label.trim().to_string(),
                started_at,
                completed_at,
                duration,
            }),
        None => Session::finished_now(session_type, label, duration),
    }
    .ok_or_else(|| {
        PomotrackError::InvalidInput(format!(
            "Session of {duration}s does not fit in the timestamp range"
        ))
    })?;

    store.upsert_session(&session)?;
    tracing::debug!(id = %session.id, kind = %session.session_type, "recorded session");
    format_session(&session, format)
}

fn import_sessions(
    store: &SqliteStore,
    file: &Path,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    let contents = std::fs::read_to_string(file).map_err(|e| {
        PomotrackError::InvalidInput(format!("Failed to read {}: {e}", file.display()))
    })?;

    let sessions: Vec<Session> = serde_json::from_str(&contents).map_err(|e| {
        PomotrackError::Parse(format!(
            "{} is not a JSON array of sessions: {e}",
            file.display()
        ))
    })?;

    let imported = store.upsert_sessions(&sessions)?;
    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "ok": true, "count": imported })),
        OutputFormat::Pretty => Ok(format!(
            "Imported {imported} sessions from {}.",
            file.display()
        )),
    }
}

/// Local midnight in epoch milliseconds.
fn start_of_today_millis() -> i64 {
    Local::now()
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map_or(0, |t| t.timestamp_millis())
}
