//! Sync command implementation.
//!
//! Resolves the backend and credentials from flags, environment and config,
//! then runs the exchange on a small tokio runtime so the blocking transfer
//! stays off the caller's thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::args::{OutputFormat, RemoteArgs, SyncBackend, SyncCommands};
use crate::config::SyncConfig;
use crate::error::PomotrackError;
use crate::output::{format_pull, format_push};
use crate::records::SqliteStore;
use crate::sync::{AzureConnector, Connector, Credentials, DirectoryConnector, SyncEngine};

/// Container used by the dir backend when none is given.
const DEFAULT_DIR_CONTAINER: &str = "pomotrack";

/// Execute sync subcommands.
///
/// # Errors
///
/// Returns an error if the remote cannot be resolved, the exchange fails, or
/// output formatting fails.
pub fn sync(
    store: Arc<SqliteStore>,
    config: &SyncConfig,
    cmd: SyncCommands,
    format: OutputFormat,
) -> Result<String, PomotrackError> {
    let (is_push, args) = match cmd {
        SyncCommands::Push(args) => (true, args),
        SyncCommands::Pull(args) => (false, args),
    };

    let remote = Remote::resolve(args, config)?;
    let engine = Arc::new(
        SyncEngine::new(store, remote.connector).with_object_name(remote.object_name),
    );
    let location = format!("{}/{}", remote.credentials.container_name, engine.object_name());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    if is_push {
        let report = runtime.block_on(engine.push_async(remote.credentials))?;
        format_push(&report, &location, format)
    } else {
        let report = runtime.block_on(engine.pull_async(remote.credentials))?;
        format_pull(&report, &location, format)
    }
}

/// Everything needed to reach the snapshot.
struct Remote {
    connector: Arc<dyn Connector>,
    credentials: Credentials,
    object_name: String,
}

impl Remote {
    fn resolve(args: RemoteArgs, config: &SyncConfig) -> Result<Self, PomotrackError> {
        let backend = args.backend.unwrap_or(config.backend);
        let object_name = args
            .object
            .unwrap_or_else(|| config.object_name.clone());
        let container = args.container.or_else(|| config.container_name.clone());

        match backend {
            SyncBackend::Azure => {
                let connector = AzureConnector::new()
                    .with_endpoint_suffix(config.endpoint_suffix.clone())
                    .with_timeout(Duration::from_secs(config.timeout_secs));
                // Blank fields are rejected by the engine before any I/O
                let credentials = Credentials::new(
                    args.account
                        .or_else(|| config.account_name.clone())
                        .unwrap_or_default(),
                    container.unwrap_or_default(),
                    args.key.unwrap_or_default(),
                );
                Ok(Self {
                    connector: Arc::new(connector),
                    credentials,
                    object_name,
                })
            }
            SyncBackend::Dir => {
                let root = args
                    .dir
                    .or_else(|| config.directory.as_ref().map(PathBuf::from))
                    .ok_or_else(|| {
                        PomotrackError::InvalidInput(
                            "The dir backend needs --dir or sync.directory in the config file"
                                .to_string(),
                        )
                    })?;
                let credentials = Credentials::new(
                    "local",
                    container.unwrap_or_else(|| DEFAULT_DIR_CONTAINER.to_string()),
                    "local",
                );
                Ok(Self {
                    connector: Arc::new(DirectoryConnector::new(root)),
                    credentials,
                    object_name,
                })
            }
        }
    }
}
