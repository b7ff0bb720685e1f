//! pomotrack - Pomodoro sessions and a kanban board with snapshot sync
//!
//! Sessions and tasks live in a local `SQLite` store. The [`sync`] module
//! copies the whole store to or from a single JSON snapshot in a remote blob
//! container, replacing the other side wholesale.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod records;
pub mod storage;
pub mod sync;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::PomotrackError;
pub use records::{Session, SessionType, SqliteStore, Task, TaskStatus};
pub use sync::{SyncEngine, SyncError};
