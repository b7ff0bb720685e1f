//! Sessions, tasks, and the store that holds them.

pub mod session;
pub mod store;
pub mod task;

pub use session::{format_duration_short, parse_duration_secs, Session, SessionType};
pub use store::{LabelCount, RecordStore, SessionStats, SqliteStore};
pub use task::{Task, TaskStatus};
