//! Command implementations

pub mod backup;
pub mod engines;
pub mod restore;

use anyhow::{Context, Result};
use std::sync::Arc;
use vaultkeep_core::config::LogLevelSetting;
use vaultkeep_core::types::RunOptions;
use vaultkeep_core::VaultkeepConfig;
use vaultkeep_store::{VaultConfig, VaultStore};

use crate::cli::Cli;
use crate::output;

/// Load configuration and apply global CLI flags on top
pub fn load_config(cli: &Cli) -> Result<VaultkeepConfig> {
    let mut config =
        VaultkeepConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(ns) = &cli.namespace {
        config.vault.namespace = Some(ns.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = LogLevelSetting(level.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Build the Vault client and check the token before any pass runs
pub async fn connect(config: &VaultkeepConfig) -> Result<Arc<VaultStore>> {
    let vault_config = VaultConfig::from_settings(&config.vault)?;
    let address = vault_config.address.clone();
    let store = VaultStore::new(vault_config)?;

    let spinner = output::spinner(&format!("Connecting to Vault at {}...", address));
    let validated = store.validate_token().await;
    spinner.finish_and_clear();
    validated.context("Vault token validation failed")?;

    Ok(Arc::new(store))
}

/// Options shared by backup and restore; `base64_encode` overrides the config file
pub fn run_options(
    config: &VaultkeepConfig,
    raw: bool,
    base64_encode: Option<bool>,
    compress: bool,
) -> RunOptions {
    RunOptions {
        raw,
        base64_encode: base64_encode.unwrap_or(config.backup.base64_encode),
        chunk_size: config.backup.chunk_size,
        compress,
    }
}
