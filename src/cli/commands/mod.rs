//! Command implementations for pomotrack.
//!
//! Each command returns the text to print; `main` owns stdout.

mod completions;
mod session;
mod sync;
mod task;

pub use completions::completions;
pub use session::session;
pub use sync::sync;
pub use task::task;
