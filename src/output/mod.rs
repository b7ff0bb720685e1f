//! Output formatting for pomotrack.
//!
//! Every command renders either colored text for a terminal or pretty JSON.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::PomotrackError;
use crate::records::{Session, SessionStats, Task};
use crate::sync::{PullReport, PushReport};

pub use json::*;
pub use pretty::*;

/// Format sessions based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_sessions(sessions: &[Session], format: OutputFormat) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_sessions_pretty(sessions)),
        OutputFormat::Json => format_sessions_json(sessions),
    }
}

/// Format a single session based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_session(session: &Session, format: OutputFormat) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_session_pretty(session)),
        OutputFormat::Json => to_json(session),
    }
}

/// Format session statistics based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_stats(
    stats: &SessionStats,
    scope: &str,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_stats_pretty(stats, scope)),
        OutputFormat::Json => to_json(stats),
    }
}

/// Format tasks based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_tasks(tasks: &[Task], format: OutputFormat) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_tasks_pretty(tasks)),
        OutputFormat::Json => format_tasks_json(tasks),
    }
}

/// Format a single task based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_task(task: &Task, format: OutputFormat) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_task_pretty(task)),
        OutputFormat::Json => to_json(task),
    }
}

/// Format a push report based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_push(
    report: &PushReport,
    destination: &str,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_push_pretty(report, destination)),
        OutputFormat::Json => format_report_json(report),
    }
}

/// Format a pull report based on output format
///
/// # Errors
///
/// Returns `PomotrackError::Parse` if JSON serialization fails.
pub fn format_pull(
    report: &PullReport,
    source: &str,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    match format {
        OutputFormat::Pretty => Ok(format_pull_pretty(report, source)),
        OutputFormat::Json => format_report_json(report),
    }
}
