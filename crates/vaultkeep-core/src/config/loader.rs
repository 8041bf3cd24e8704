//! Configuration loading with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. YAML config file (explicit path, else ./vaultkeep.yaml when present)
//! 3. Environment variables (VAULT_* and VAULTKEEP_*)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::DEFAULT_CHUNK_SIZE;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;
use tracing::debug;

/// Configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "vaultkeep.yaml";

/// Loaded vaultkeep configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultkeepConfig {
    pub vault: VaultSettings,
    pub backup: BackupSettings,
    pub log_level: LogLevelSetting,
}

/// Connection settings for the remote Vault server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub address: Option<String>,
    pub namespace: Option<String>,
    pub timeout_secs: u64,
    pub skip_verify: bool,
    pub retry: RetrySettings,

    /// Only ever taken from VAULT_TOKEN
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            address: None,
            namespace: None,
            timeout_secs: 30,
            skip_verify: false,
            retry: RetrySettings::default(),
            token: None,
        }
    }
}

impl VaultSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Backoff for idempotent reads and listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Local backup layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    pub dest: Utf8PathBuf,
    pub source: Utf8PathBuf,
    pub chunk_size: usize,
    pub base64_encode: bool,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            dest: Utf8PathBuf::from("backup"),
            source: Utf8PathBuf::from("backup"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            base64_encode: true,
        }
    }
}

/// Log level name, validated on load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevelSetting(pub String);

impl Default for LogLevelSetting {
    fn default() -> Self {
        Self("info".to_string())
    }
}

/// Map a user-supplied log level onto a tracing filter directive.
///
/// Accepts the usual tracing names plus `dpanic`, `panic` and `fatal`,
/// which all collapse to `error`.
pub fn normalize_log_level(level: &str) -> Result<&'static str> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "dpanic" | "panic" | "fatal" => Ok("error"),
        other => Err(Error::config(format!(
            "Unknown log level '{}' (expected trace, debug, info, warn, error)",
            other
        ))),
    }
}

impl VaultkeepConfig {
    /// Load configuration from the given file, or from ./vaultkeep.yaml if it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_file(p)?,
            None => {
                let default_path = Utf8Path::new(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::load_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn load_file(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(format!("Configuration file not found: {}", path))
            } else {
                Error::Io(e)
            }
        })?;
        debug!("Loaded configuration from {}", path);
        Ok(serde_yaml_ng::from_str(&content)?)
    }

    /// Apply VAULT_* and VAULTKEEP_* environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("VAULT_ADDR") {
            self.vault.address = Some(val);
        }

        if let Ok(val) = env::var("VAULT_TOKEN") {
            self.vault.token = Some(val);
        }

        if let Ok(val) = env::var("VAULT_NAMESPACE") {
            self.vault.namespace = Some(val);
        }

        if let Ok(val) = env::var("VAULT_TIMEOUT") {
            self.vault.timeout_secs = val
                .trim_end_matches('s')
                .parse()
                .map_err(|_| Error::config("VAULT_TIMEOUT must be a number of seconds"))?;
        }

        if let Ok(val) = env::var("VAULT_SKIP_VERIFY") {
            self.vault.skip_verify = val == "true" || val == "1";
        }

        if let Ok(val) = env::var("VAULTKEEP_LOG_LEVEL") {
            self.log_level = LogLevelSetting(val);
        }

        if let Ok(val) = env::var("VAULTKEEP_CHUNK_SIZE") {
            self.backup.chunk_size = val
                .parse()
                .map_err(|_| Error::config("VAULTKEEP_CHUNK_SIZE must be a valid number"))?;
        }

        Ok(())
    }

    /// Reject settings no pass could run with
    pub fn validate(&self) -> Result<()> {
        if self.backup.chunk_size == 0 {
            return Err(Error::config("backup.chunk_size must be at least 1"));
        }
        normalize_log_level(&self.log_level.0)?;
        Ok(())
    }
}
