//! toggly - feature-flag configuration CLI
//!
//! Thin driver over `toggly_core`: every command opens the store, runs one
//! operation in the caller's owner scope and prints the result as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use toggly_core::{
    default_log_level, init_logging, init_stderr_logging, Scope, SqliteDocumentStore, StoreConfig,
    Toggly,
};

mod commands;

/// toggly - feature-flag configuration store
#[derive(Parser, Debug)]
#[command(name = "toggly")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file (in-memory when omitted)
    #[arg(long, env = "TOGGLY_DB_PATH")]
    db: Option<PathBuf>,

    /// Owner every command runs as
    #[arg(long, env = "TOGGLY_OWNER")]
    owner: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TOGGLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (stderr when omitted)
    #[arg(long, env = "TOGGLY_LOG_DIR")]
    log_dir: Option<String>,

    /// Deadline for each storage call, in milliseconds
    #[arg(long, env = "TOGGLY_OP_DEADLINE_MS", default_value_t = toggly_core::config::DEFAULT_OP_DEADLINE_MS)]
    deadline_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Projects owned by the caller
    #[command(subcommand)]
    Project(commands::ProjectCommands),

    /// Environments of a project
    Env(EnvArgs),

    /// Groups of an environment
    Group(GroupArgs),

    /// Parameters of a group
    Param(ParamArgs),
}

#[derive(Args, Debug)]
struct EnvArgs {
    #[arg(long)]
    project: String,

    #[command(subcommand)]
    command: commands::EnvironmentCommands,
}

#[derive(Args, Debug)]
struct GroupArgs {
    #[arg(long)]
    project: String,

    #[arg(long)]
    env: String,

    #[command(subcommand)]
    command: commands::GroupCommands,
}

#[derive(Args, Debug)]
struct ParamArgs {
    #[arg(long)]
    project: String,

    #[arg(long)]
    env: String,

    #[arg(long)]
    group: String,

    #[command(subcommand)]
    command: commands::ParameterCommands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
    let logging = match cli.log_dir.as_deref() {
        Some(dir) => init_logging(level, dir),
        None => init_stderr_logging(level),
    };
    logging
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let config = StoreConfig {
        path: cli.db.clone(),
        op_deadline_ms: cli.deadline_ms,
    };
    let store = SqliteDocumentStore::open(&config).context("failed to open store")?;
    debug!(
        "event=cli_start module=cli status=ok owner={} db={:?}",
        cli.owner, config.path
    );
    let api = Toggly::new(store);
    let owner = Scope::for_owner(cli.owner);

    let output = match cli.command {
        Commands::Project(command) => commands::run_project(&api, &owner, command)?,
        Commands::Env(args) => {
            let scope = owner.with_project(args.project);
            commands::run_environment(&api, &scope, args.command)?
        }
        Commands::Group(args) => {
            let scope = owner
                .with_project(args.project)
                .with_environment(args.env);
            commands::run_group(&api, &scope, args.command)?
        }
        Commands::Param(args) => {
            let scope = owner
                .with_project(args.project)
                .with_environment(args.env)
                .with_group(args.group);
            commands::run_parameter(&api, &scope, args.command)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
