//! # vaultkeep-core
//!
//! Core library for vaultkeep providing:
//! - The error taxonomy shared by the store and engine crates
//! - Mount, engine type, key path and payload types
//! - Configuration loading (defaults, YAML file, environment)

pub mod config;
pub mod error;
pub mod types;

pub use config::VaultkeepConfig;
pub use error::{Error, Result};
