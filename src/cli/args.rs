use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pomotrack")]
#[command(about = "Pomodoro sessions and a kanban board, synced through blob storage")]
#[command(long_about = "pomotrack - Pomodoro tracking with a kanban board

Records finished focus blocks and breaks, keeps a three-column task board
(todo, in-progress, done), and copies the whole store to or from a single
JSON snapshot in Azure Blob Storage or a shared folder.

QUICK START:
  pomotrack session add --label writing     Record a 25 minute focus block
  pomotrack task add \"Draft chapter 3\"       Add a card to the board
  pomotrack task move <id> in-progress      Start working on it
  pomotrack sync push                       Upload everything

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Path to the database file
    #[arg(long, global = true, env = "POMOTRACK_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

/// Where sync snapshots are stored.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncBackend {
    /// Azure Blob Storage container.
    #[default]
    Azure,
    /// Folder on disk (network share, synced folder, USB stick).
    Dir,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record and review pomodoro sessions
    #[command(alias = "s")]
    Session(SessionArgs),

    /// Manage the kanban board
    #[command(alias = "t")]
    Task(TaskArgs),

    /// Push or pull the whole store as a snapshot
    ///
    /// Push overwrites the remote snapshot with local state.
    /// Pull replaces ALL local sessions and tasks with the remote snapshot.
    /// Nothing is merged.
    Sync(SyncArgs),

    /// Generate shell completions
    ///
    /// Example: pomotrack completions zsh > ~/.zsh/completions/_pomotrack
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands.
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Record a finished session
    ///
    /// Examples:
    ///   pomotrack session add
    ///   pomotrack session add --type short-break
    ///   pomotrack session add --label reading --duration 50m
    Add {
        /// Session type (focus, short-break, long-break)
        #[arg(long = "type", short = 't', default_value = "focus")]
        session_type: String,

        /// Free-form label
        #[arg(long, short = 'l')]
        label: Option<String>,

        /// Length (e.g. 1500, 25m, 1h30m); defaults to the type's standard length
        #[arg(long, short = 'd')]
        duration: Option<String>,

        /// Start time in epoch milliseconds; defaults to `duration` ago
        #[arg(long)]
        started_at: Option<i64>,
    },

    /// List recent sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Summarize today's sessions
    Stats {
        /// Summarize every session instead of just today
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Import sessions from a JSON array file
    ///
    /// Existing sessions with the same id are overwritten.
    Import {
        /// File containing `[{"id": ..., "type": ..., ...}]`
        file: PathBuf,
    },

    /// Delete all session history
    Clear {
        /// Confirm the deletion
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

/// Task subcommands.
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to the todo column
    Add {
        /// Task title
        title: String,
    },

    /// List tasks, oldest first
    List {
        /// Only show one column (todo, in-progress, done)
        #[arg(long, short = 's')]
        status: Option<String>,
    },

    /// Move a task to another column
    ///
    /// Only one task can be in progress; starting another sends the
    /// current one back to todo.
    Move {
        /// Task ID
        id: String,
        /// Target column (todo, in-progress, done)
        status: String,
    },

    /// Count a finished pomodoro against a task
    Pomodoro {
        /// Task ID; defaults to the in-progress task
        id: Option<String>,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        id: String,
    },

    /// Delete tasks from the board
    Clear {
        /// Only delete tasks in the done column
        #[arg(long)]
        done: bool,

        /// Confirm the deletion
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommands,
}

/// Sync subcommands.
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Upload local sessions and tasks, overwriting the remote snapshot
    Push(RemoteArgs),

    /// Replace local sessions and tasks with the remote snapshot
    Pull(RemoteArgs),
}

/// Which remote to talk to and how to authenticate.
#[derive(Args, Default)]
pub struct RemoteArgs {
    /// Remote backend; defaults to `sync.backend` from the config file
    #[arg(long, value_enum)]
    pub backend: Option<SyncBackend>,

    /// Storage account name
    #[arg(long, env = "POMOTRACK_AZURE_ACCOUNT")]
    pub account: Option<String>,

    /// Container name (subfolder for the dir backend)
    #[arg(long, env = "POMOTRACK_AZURE_CONTAINER")]
    pub container: Option<String>,

    /// Storage account access key
    #[arg(long, env = "POMOTRACK_AZURE_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Root folder for the dir backend
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Snapshot object name
    #[arg(long)]
    pub object: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "pomotrack", "task", "list", "-o", "json", "--db", "/tmp/p.db", "-v",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/p.db")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_session_add_defaults() {
        let cli = Cli::try_parse_from(["pomotrack", "session", "add"]).unwrap();
        let Commands::Session(args) = cli.command else {
            panic!("Expected Session command");
        };
        let SessionCommands::Add {
            session_type,
            label,
            duration,
            started_at,
        } = args.command
        else {
            panic!("Expected Add subcommand");
        };
        assert_eq!(session_type, "focus");
        assert!(label.is_none());
        assert!(duration.is_none());
        assert!(started_at.is_none());
    }

    #[test]
    fn test_task_move() {
        let cli =
            Cli::try_parse_from(["pomotrack", "task", "move", "task-1", "in-progress"]).unwrap();
        let Commands::Task(args) = cli.command else {
            panic!("Expected Task command");
        };
        assert!(matches!(
            args.command,
            TaskCommands::Move { ref id, ref status } if id == "task-1" && status == "in-progress"
        ));
    }

    #[test]
    fn test_sync_push_flags() {
        let cli = Cli::try_parse_from([
            "pomotrack",
            "sync",
            "push",
            "--backend",
            "dir",
            "--dir",
            "/mnt/share",
            "--object",
            "backup.json",
        ])
        .unwrap();
        let Commands::Sync(args) = cli.command else {
            panic!("Expected Sync command");
        };
        let SyncCommands::Push(remote) = args.command else {
            panic!("Expected Push subcommand");
        };
        assert_eq!(remote.backend, Some(SyncBackend::Dir));
        assert_eq!(remote.dir, Some(PathBuf::from("/mnt/share")));
        assert_eq!(remote.object.as_deref(), Some("backup.json"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["pomotrack", "sync", "pull", "--backend", "s3"]).is_err());
    }

    #[test]
    fn test_completions_shell() {
        let cli = Cli::try_parse_from(["pomotrack", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
