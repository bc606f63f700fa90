//! RagBridge CLI — the main entry point.
//!
//! Commands:
//! - `inlet`    — Run a chat body through the inlet hook
//! - `outlet`   — Run a response body through the outlet hook
//! - `query`    — Ask the retrieval backend and show the composed context
//! - `healthz`  — Serve the liveness probe
//! - `check`    — Validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ragbridge",
    about = "RagBridge — retrieval context injection for chat pipelines",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.ragbridge/config.toml)
    #[arg(short, long, global = true, env = "RAGBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a chat request through the inlet hook and print the result as JSON
    Inlet {
        /// Read the body from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run a response through the outlet hook
    Outlet {
        /// Read the body from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Query the retrieval backend and print context and sources
    Query {
        /// The question to retrieve context for
        text: String,
    },

    /// Serve the liveness probe
    Healthz {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the ready file
        #[arg(long)]
        ready_file: Option<PathBuf>,
    },

    /// Load and validate configuration
    Check {
        /// Print a config file with every default filled in, then exit
        #[arg(long)]
        print_default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON output.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(ragbridge_config::AppConfig::default_path);

    match cli.command {
        Commands::Inlet { file } => commands::inlet::run(&config_path, file).await?,
        Commands::Outlet { file } => commands::outlet::run(&config_path, file).await?,
        Commands::Query { text } => commands::query::run(&config_path, &text).await?,
        Commands::Healthz { port, ready_file } => {
            commands::healthz::run(&config_path, port, ready_file).await?
        }
        Commands::Check { print_default } => {
            commands::check::run(&config_path, print_default).await?
        }
    }

    Ok(())
}
