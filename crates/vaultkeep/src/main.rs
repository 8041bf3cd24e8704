//! vaultkeep CLI - back up and restore Vault secrets engines
//!
//! This is the main entry point for the vaultkeep command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    let config = commands::load_config(&cli)?;

    init_tracing(&config.log_level.0)?;

    match cli.command {
        Commands::Backup(args) => commands::backup::run(args, config).await,
        Commands::Restore(args) => commands::restore::run(args, config).await,
        Commands::Engines(args) => commands::engines::run(args, config).await,
    }
}

/// Initialize tracing at the configured level
fn init_tracing(level: &str) -> Result<()> {
    let directive = vaultkeep_core::config::normalize_log_level(level)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::new(directive))
        .init();
    Ok(())
}
