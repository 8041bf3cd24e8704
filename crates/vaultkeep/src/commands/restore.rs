//! Restore command

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Args;
use vaultkeep_core::VaultkeepConfig;
use vaultkeep_engines::Driver;

use crate::commands::{connect, run_options};
use crate::output::{self, Direction};

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Mount path to restore into (default: every engine directory under the source)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Source directory; with --path, the `<mount>.<type>` directory itself
    #[arg(short, long)]
    pub source: Option<Utf8PathBuf>,

    /// Write engine state to the raw storage keyspace where supported
    #[arg(short, long)]
    pub raw: bool,

    /// Raw files in the source are base64 encoded (default: backup.base64_encode from config)
    #[arg(
        short = 'e',
        long = "b64encode",
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub b64encode: Option<bool>,

    /// Backup files are compressed (not implemented)
    #[arg(short, long)]
    pub compress: bool,
}

pub async fn run(args: RestoreArgs, config: VaultkeepConfig) -> Result<()> {
    let source = args.source.unwrap_or_else(|| config.backup.source.clone());

    output::header("Vault restore");
    output::kv("Source", source.as_str());
    output::kv("Mount", args.path.as_deref().unwrap_or("all"));
    if !source.exists() {
        anyhow::bail!("Restore source not found: {}", source);
    }

    let store = connect(&config).await?;
    let driver = Driver::new(store, run_options(&config, args.raw, args.b64encode, args.compress));

    let report = driver.restore(&source, args.path.as_deref()).await?;
    if report.mounts.is_empty() {
        output::info(&format!("No engine directories found in {}", source));
        return Ok(());
    }

    output::report(Direction::Restore, &report);
    Ok(())
}
