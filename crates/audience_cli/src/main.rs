//! Audience CLI - command-line interface for the audience exporter.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::export::RelationArg;
use crate::commands::limits::OutputFormat;

#[derive(Parser)]
#[command(name = "audience")]
#[command(version)]
#[command(about = "Export the audience of GitHub repositories to CSV")]
#[command(
    long_about = "Audience collects the stargazers, watchers and forkers of GitHub \
repositories, enriches each username with its public profile, and exports the result \
as CSV partitioned by email presence. Resolved profiles are cached in a local SQLite \
database so reruns stay cheap on the API quota."
)]
#[command(after_long_help = r#"EXAMPLES
    Export the full audience of a repository:
        $ audience export https://github.com/d6t/d6tflow

    Export several repositories into one CSV pair:
        $ audience export github.com/d6t/d6tflow github.com/d6t/d6tpipe

    Only stargazers, written to a specific directory:
        $ audience export -r stars -o ./out https://github.com/rust-lang/mdBook

    Check remaining API quota:
        $ audience limits

    Generate shell completions:
        $ audience completions bash > ~/.local/share/bash-completion/completions/audience

CONFIGURATION
    Audience reads configuration from:
      1. ~/.config/audience/config.toml (or $XDG_CONFIG_HOME/audience/config.toml)
      2. ./audience.toml
      3. Environment variables (AUDIENCE_* prefix, e.g., AUDIENCE_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    AUDIENCE_DATABASE_URL     Database connection string (default: ~/.local/state/audience/audience.db)
    AUDIENCE_GITHUB_TOKEN     GitHub personal access token
    AUDIENCE_EXPORT_DIR       Directory for CSV output files (default: current directory)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the audience of one or more repositories to CSV
    Export {
        /// Repository URL(s), e.g. https://github.com/owner/name
        #[arg(required = true)]
        urls: Vec<String>,

        /// GitHub API token (overrides config file and environment)
        #[arg(short = 't', long)]
        token: Option<String>,

        /// Directory for the CSV files (default from config or current directory)
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Membership sets to collect (default: all three)
        #[arg(short = 'r', long, value_enum, value_delimiter = ',')]
        relations: Vec<RelationArg>,

        /// Skip the profile cache and fetch every profile fresh
        #[arg(long)]
        no_cache: bool,
    },
    /// Show current rate limit status
    Limits {
        /// GitHub API token (overrides config file and environment)
        #[arg(short = 't', long)]
        token: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Set up graceful shutdown handler (Ctrl+C)
    let shutdown = shutdown::install();

    // Initialize tracing for non-TTY mode (structured logging)
    // Only initialize if not connected to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("audience=info,audience_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    // Handle commands that don't require database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .expect("Failed to determine database URL - this should not happen");

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        // Warn if using a relative path (can cause issues depending on cwd)
        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Export {
            urls,
            token,
            output_dir,
            relations,
            no_cache,
        } => {
            commands::export::handle_export(
                urls,
                relations,
                token,
                output_dir,
                no_cache,
                &config,
                &database_url,
                &shutdown,
            )
            .await?;
        }
        Commands::Limits { token, output } => {
            commands::limits::handle_limits(token, output, &config).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
