//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

pub use crate::commands::backup::BackupArgs;
pub use crate::commands::engines::EnginesArgs;
pub use crate::commands::restore::RestoreArgs;

/// vaultkeep - back up and restore Vault secrets engines
#[derive(Parser, Debug)]
#[command(name = "vaultkeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to vaultkeep.yaml config file
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Vault namespace
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Back up secrets engines to local files
    Backup(BackupArgs),

    /// Restore secrets engines from local files
    Restore(RestoreArgs),

    /// List mounted secrets engines
    Engines(EnginesArgs),
}
