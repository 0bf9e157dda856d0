//! ReelSearch CLI
//!
//! Hybrid keyword and vector search for a movie catalog.

use anyhow::Result;
use clap::Parser;
use reelsearch_core::error::exit_codes;
use reelsearch_core::{Config, Database, ReelSearchError};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<ReelSearchError>()
            .map(ReelSearchError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    // Open database (use REELSEARCH_DB env var if set, otherwise use default)
    let db_path = std::env::var("REELSEARCH_DB")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| Database::default_path());
    let db = Database::open(&db_path)?;
    db.initialize()?;
    tracing::debug!("Using database {}", db_path.display());

    match cli.command {
        Commands::Search(args) => commands::search::run(args, &db, &config, cli.format).await,
        Commands::Item(args) => commands::item::run(args, &db, &config, cli.format).await,
        Commands::Index(args) => commands::index::run(args, &db, &config).await,
        Commands::Status => commands::status::run(&db, &config, &db_path, cli.format).await,
    }
}
