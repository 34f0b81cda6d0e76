//! CLI parser and dispatch.

mod search;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use instante_scrape::config::Settings;

use search::SearchArgs;

#[derive(Parser)]
#[command(name = "instante")]
#[command(about = "Search court decisions on instante.justice.md")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "INSTANTE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one search and print the outcome as JSON
    Search(SearchArgs),
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            serve::cmd_serve(&settings, &host, port).await
        }
        Commands::Search(args) => search::cmd_search(settings, args).await,
    }
}
