//! Pomodoro session records.
//!
//! A session is written once, when a focus block or break finishes.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a recorded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    /// Focus block (25 minutes by default)
    Focus,
    /// Short break (5 minutes)
    ShortBreak,
    /// Long break (15 minutes)
    LongBreak,
}

impl SessionType {
    /// Get the default duration for this session type.
    #[must_use]
    pub const fn default_duration(&self) -> Duration {
        match self {
            Self::Focus => Duration::minutes(25),
            Self::ShortBreak => Duration::minutes(5),
            Self::LongBreak => Duration::minutes(15),
        }
    }

    /// Parse a session type, accepting the wire name and short aliases.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "focus" | "f" | "pomodoro" | "pomo" => Some(Self::Focus),
            "short-break" | "short" | "sb" => Some(Self::ShortBreak),
            "long-break" | "long" | "lb" => Some(Self::LongBreak),
            _ => None,
        }
    }

    /// Name used on the wire and in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short-break",
            Self::LongBreak => "long-break",
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    /// Check if this is a break type.
    #[must_use]
    pub const fn is_break(&self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique key
    pub id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    #[serde(default)]
    pub label: String,
    /// Epoch milliseconds
    pub started_at: i64,
    /// Epoch milliseconds
    pub completed_at: i64,
    /// Seconds
    pub duration: i64,
}

impl Session {
    /// Record a session that finished just now after running for `duration` seconds.
    ///
    /// Returns `None` if the start time does not fit in epoch milliseconds.
    #[must_use]
    pub fn finished_now(session_type: SessionType, label: &str, duration: i64) -> Option<Self> {
        let completed_at = Utc::now().timestamp_millis();
        let started_at = completed_at.checked_sub(duration.checked_mul(1000)?)?;
        Some(Self {
            id: new_session_id(),
            session_type,
            label: label.trim().to_string(),
            started_at,
            completed_at,
            duration,
        })
    }

    /// Label for grouping, with a placeholder for empty labels.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            "Unlabeled"
        } else {
            &self.label
        }
    }
}

/// Generate a fresh session id.
#[must_use]
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a duration string into seconds.
///
/// Accepts `1500` (seconds), `25m`, `1h30m`, `90s`. Values that overflow
/// an `i64` of seconds are rejected.
#[must_use]
pub fn parse_duration_secs(s: &str) -> Option<i64> {
    let s = s.trim().to_lowercase();

    if let Ok(seconds) = s.parse::<i64>() {
        return (seconds > 0).then_some(seconds);
    }

    let mut total_seconds: i64 = 0;
    let mut current_num = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            current_num.push(c);
        } else if !current_num.is_empty() {
            let num: i64 = current_num.parse().ok()?;
            current_num.clear();

            let seconds = match c {
                'h' => num.checked_mul(3600)?,
                'm' => num.checked_mul(60)?,
                's' => num,
                _ => return None,
            };
            total_seconds = total_seconds.checked_add(seconds)?;
        } else if !c.is_whitespace() {
            return None;
        }
    }

    // Trailing number without a unit is seconds
    if !current_num.is_empty() {
        let num: i64 = current_num.parse().ok()?;
        total_seconds = total_seconds.checked_add(num)?;
    }

    (total_seconds > 0).then_some(total_seconds)
}

/// Format a number of seconds as a short string (e.g., "25m", "1h 30m").
#[must_use]
pub fn format_duration_short(seconds: i64) -> String {
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if total_minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}
