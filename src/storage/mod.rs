//! Storage layer for pomotrack.
//!
//! This module provides SQLite-based persistence for:
//! - Completed Pomodoro sessions
//! - Kanban tasks

mod database;
mod migrations;

pub use database::Database;
