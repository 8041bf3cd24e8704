//! Engines command

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use vaultkeep_core::VaultkeepConfig;
use vaultkeep_store::SecretStore;

use crate::commands::connect;
use crate::output;

#[derive(Args, Debug)]
pub struct EnginesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled, Serialize)]
struct EngineRow {
    path: String,
    #[tabled(rename = "type")]
    engine_type: String,
    uuid: String,
    supported: bool,
}

pub async fn run(args: EnginesArgs, config: VaultkeepConfig) -> Result<()> {
    let store = connect(&config).await?;
    let mut mounts = store.list_mounted_engines().await?;
    mounts.sort_by(|a, b| a.path.cmp(&b.path));

    let rows: Vec<EngineRow> = mounts
        .into_iter()
        .map(|m| EngineRow {
            supported: m.engine_type.is_supported(),
            engine_type: m.engine_type.to_string(),
            path: m.path,
            uuid: m.uuid,
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&rows).context("Failed to serialize engines")?;
        println!("{}", json);
    } else if rows.is_empty() {
        output::warning("No secrets engines mounted");
    } else {
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{}", table);
    }
    Ok(())
}
