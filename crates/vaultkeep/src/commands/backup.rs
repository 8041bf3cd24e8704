//! Backup command

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Args;
use vaultkeep_core::VaultkeepConfig;
use vaultkeep_engines::Driver;

use crate::commands::{connect, run_options};
use crate::output::{self, Direction};

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Mount path to back up (default: every supported mount)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Destination directory (default: backup.dest from config)
    #[arg(short, long)]
    pub dest: Option<Utf8PathBuf>,

    /// Read engine state from the raw storage keyspace where supported
    #[arg(short, long)]
    pub raw: bool,

    /// Base64 encode raw values (default: backup.base64_encode from config)
    #[arg(
        short = 'e',
        long = "b64encode",
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub b64encode: Option<bool>,

    /// Compress backup files (not implemented)
    #[arg(short, long)]
    pub compress: bool,
}

pub async fn run(args: BackupArgs, config: VaultkeepConfig) -> Result<()> {
    let dest = args.dest.unwrap_or_else(|| config.backup.dest.clone());

    output::header("Vault backup");
    output::kv("Destination", dest.as_str());
    output::kv("Mount", args.path.as_deref().unwrap_or("all"));
    output::flag("Raw mode", args.raw);

    let options = run_options(&config, args.raw, args.b64encode, args.compress);
    output::flag("Base64 encoding", options.base64_encode);

    let store = connect(&config).await?;
    let driver = Driver::new(store, options);

    let report = driver.backup(&dest, args.path.as_deref()).await?;
    output::report(Direction::Backup, &report);
    Ok(())
}
