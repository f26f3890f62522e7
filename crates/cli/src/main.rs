//! Docent CLI
//!
//! Main entry point for the docent command-line tool.
//! Searches and maintains the local knowledge index of a workspace.

mod commands;

use clap::{Parser, Subcommand};
use commands::{FilesCommand, ReloadCommand, SearchCommand, StatusCommand};
use docent_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Docent - grounded answers from a folder of operator documents
#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(about = "Search a local knowledge index built from .txt and .md files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCENT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve the passages most relevant to a query
    Search(SearchCommand),

    /// Discard the persisted index and rebuild it
    Reload(ReloadCommand),

    /// List files loaded by the last rebuild
    Files(FilesCommand),

    /// Show the state of the knowledge index
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    )?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Docent CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Search(_) => "search",
        Commands::Reload(_) => "reload",
        Commands::Files(_) => "files",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Reload(cmd) => cmd.execute(&config).await,
        Commands::Files(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
