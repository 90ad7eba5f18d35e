//! ongoku CLI
//!
//! Keeps a local project directory in sync with its ongoku project: schema
//! upload and download, repository push, pull and clone.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ongoku::{PushMode, SyncError};

mod commands;
mod logging;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ongoku")]
#[command(about = "Sync local projects with ongoku")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an account token
    Login {
        /// Token value (read from stdin when omitted)
        #[arg(long, conflicts_with = "token_file")]
        token: Option<String>,
        /// Read the token from a file
        #[arg(long, value_name = "PATH")]
        token_file: Option<String>,
    },
    /// Remove the stored account token
    Logout,
    /// Upload the schema and push local commits
    Push {
        /// Only upload the schema; the service commits it
        #[arg(long, conflicts_with = "code_only")]
        schema_only: bool,
        /// Only commit and push the working copy
        #[arg(long)]
        code_only: bool,
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Pull remote changes into the working copy
    Pull {
        /// Pull even with uncommitted changes
        #[arg(short, long, visible_short_alias = 'y')]
        force: bool,
    },
    /// Clone a project by name or id
    Clone {
        /// Project name or id
        project: String,
        /// Destination directory (defaults to ongoku-<id>)
        dir: Option<PathBuf>,
    },
    /// Show local and remote project status
    Status,
    /// List projects available to the account
    #[command(alias = "ls")]
    Projects,
    /// Schema operations
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Download the project's schema into the manifest
    Pull,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (api-url)
        key: String,
        /// Value to set
        value: String,
    },
}

fn push_mode(schema_only: bool, code_only: bool) -> PushMode {
    match (schema_only, code_only) {
        (true, _) => PushMode::SchemaOnly,
        (_, true) => PushMode::CodeOnly,
        _ => PushMode::Both,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output).await {
        let hint = e
            .downcast_ref::<SyncError>()
            .and_then(SyncError::remediation);
        output.error(&format!("{:#}", e), hint.as_deref());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let directory = match cli.directory {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("Cannot use directory '{}'", dir.display()))?,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match cli.command {
        Commands::Login { token, token_file } => {
            commands::auth::login(token.as_deref(), token_file.as_deref(), output).await
        }
        Commands::Logout => commands::auth::logout(output),
        Commands::Push {
            schema_only,
            code_only,
            message,
        } => {
            let mode = push_mode(schema_only, code_only);
            commands::sync::push(&directory, mode, message, output).await
        }
        Commands::Pull { force } => commands::sync::pull(&directory, force, output).await,
        Commands::Clone { project, dir } => {
            commands::sync::clone(&directory, &project, dir, output).await
        }
        Commands::Status => commands::status::show(&directory, output).await,
        Commands::Projects => commands::project::list(output).await,
        Commands::Schema { command } => match command {
            SchemaCommands::Pull => commands::project::schema_pull(&directory, output).await,
        },
        Commands::Config { command } => match command {
            None | Some(ConfigCommands::Show) => commands::config::show(output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(&key, &value, output)
            }
        },
    }
}
