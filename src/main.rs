use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use pomotrack::cli::args::{Cli, Commands};
use pomotrack::cli::commands;
use pomotrack::config::Config;
use pomotrack::storage::Database;
use pomotrack::SqliteStore;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {e}", "error".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(cli.verbose, &config.general.log_level);

    let format = cli.output.unwrap_or(config.general.default_output);

    let output = match cli.command {
        Commands::Completions { shell } => commands::completions(shell)?,
        command => {
            let db = match cli.db.as_deref() {
                Some(path) => Database::open_at(path)?,
                None => Database::open()?,
            };
            let store = Arc::new(SqliteStore::with_database(db));

            match command {
                Commands::Session(args) => commands::session(&store, args.command, format)?,
                Commands::Task(args) => commands::task(&store, args.command, format)?,
                Commands::Sync(args) => {
                    commands::sync(store, &config.sync, args.command, format)?
                }
                Commands::Completions { .. } => String::new(),
            }
        }
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_tracing(verbose: bool, configured: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pomotrack=debug")
        } else {
            EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
