//! Configuration loading and management

mod loader;

pub use loader::{
    normalize_log_level, BackupSettings, LogLevelSetting, RetrySettings, VaultSettings,
    VaultkeepConfig, CONFIG_FILE_NAME,
};
