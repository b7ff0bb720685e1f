use chrono::{DateTime, Local};
use colored::Colorize;

use crate::records::{format_duration_short, Session, SessionStats, Task, TaskStatus};
use crate::sync::{PullReport, PushReport};

/// Render epoch milliseconds as local `YYYY-MM-DD HH:MM`.
fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn status_icon(status: TaskStatus) -> colored::ColoredString {
    match status {
        TaskStatus::Todo => "[ ]".white(),
        TaskStatus::InProgress => "[>]".yellow(),
        TaskStatus::Done => "[x]".green(),
    }
}

/// Format a list of sessions as a table
pub fn format_sessions_pretty(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "Sessions (0)\n  No sessions recorded".to_string();
    }

    let mut output = format!("Sessions ({})\n", sessions.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for session in sessions {
        let kind = if session.session_type.is_break() {
            session.session_type.display_name().blue()
        } else {
            session.session_type.display_name().green()
        };

        output.push_str(&format!(
            "{}  {:<12} {:>7}  {}\n",
            format_millis(session.started_at).dimmed(),
            kind,
            format_duration_short(session.duration),
            session.display_label().bold()
        ));
    }

    output
}

/// Format a single recorded session
pub fn format_session_pretty(session: &Session) -> String {
    let mut output = format!(
        "{} {} recorded\n",
        "✓".green(),
        session.session_type.display_name().bold()
    );
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), session.id));
    output.push_str(&format!("  {}: {}\n", "Label".dimmed(), session.display_label()));
    output.push_str(&format!(
        "  {}: {}\n",
        "Duration".dimmed(),
        format_duration_short(session.duration)
    ));
    output.push_str(&format!(
        "  {}: {}\n",
        "Finished".dimmed(),
        format_millis(session.completed_at)
    ));
    output
}

/// Format the session summary
pub fn format_stats_pretty(stats: &SessionStats, scope: &str) -> String {
    let mut output = format!("{}\n", format!("Sessions ({scope})").bold());
    output.push_str(&"─".repeat(40));
    output.push('\n');
    output.push_str(&format!(
        "  Focus: {}  Breaks: {}  Focus time: {}\n",
        stats.focus_count.to_string().green(),
        stats.break_count.to_string().blue(),
        format!("{}m", stats.total_focus_minutes).cyan()
    ));

    if !stats.label_breakdown.is_empty() {
        output.push('\n');
        output.push_str(&format!("  {}\n", "By label".dimmed()));
        for entry in &stats.label_breakdown {
            output.push_str(&format!("    {:<24} {}\n", entry.label, entry.count));
        }
    }

    output
}

/// Format the board, one column at a time
pub fn format_tasks_pretty(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "Tasks (0)\n  Board is empty".to_string();
    }

    let mut output = format!("Tasks ({})\n", tasks.len());
    for status in TaskStatus::ALL {
        let column: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
        if column.is_empty() {
            continue;
        }

        output.push_str(&"─".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{} ({})\n",
            status.display_name().bold(),
            column.len()
        ));

        for task in column {
            let title = match task.status {
                TaskStatus::Done => task.title.dimmed().to_string(),
                _ => task.title.clone(),
            };
            let mut line = format!("{} {}", status_icon(task.status), title);
            if task.pomodoros_completed > 0 {
                line.push_str(&format!(
                    "  {}",
                    format!("🍅 {}", task.pomodoros_completed).red()
                ));
            }
            line.push_str(&format!("  {}", task.id.dimmed()));
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

/// Format a single task
pub fn format_task_pretty(task: &Task) -> String {
    let mut output = format!("{} {}\n", status_icon(task.status), task.title.bold());
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), task.id));
    output.push_str(&format!("  {}: {}\n", "Status".dimmed(), task.status.display_name()));
    output.push_str(&format!(
        "  {}: {}\n",
        "Pomodoros".dimmed(),
        task.pomodoros_completed
    ));
    output.push_str(&format!(
        "  {}: {}\n",
        "Created".dimmed(),
        format_millis(task.created_at)
    ));
    if let Some(completed) = task.completed_at {
        output.push_str(&format!(
            "  {}: {}\n",
            "Completed".dimmed(),
            format_millis(completed)
        ));
    }
    output
}

/// Summarize a push
pub fn format_push_pretty(report: &PushReport, destination: &str) -> String {
    format!(
        "{} Pushed {} sessions and {} tasks to {}\n  {}: {}",
        "✓".green(),
        report.exported_sessions,
        report.exported_tasks,
        destination.bold(),
        "Exported at".dimmed(),
        report.exported_at
    )
}

/// Summarize a pull
pub fn format_pull_pretty(report: &PullReport, source: &str) -> String {
    format!(
        "{} Pulled {} sessions and {} tasks from {}\n  {}",
        "✓".green(),
        report.imported_sessions,
        report.imported_tasks,
        source.bold(),
        "Local sessions and tasks were replaced.".dimmed()
    )
}
