//! Backup and restore engines for Vault secrets engines
//!
//! Building blocks, leaves first:
//!
//! - [`walker`]: recursive listing of remote and local trees
//! - [`transfer`]: single-key backup and restore, logical or raw
//! - [`chunk`]: fixed-size `file<seq>.json` batches for flat keyspaces
//! - [`versioned`]: capture and ordered replay of versioned secret history
//! - [`mapping`]: declarative field remapping for config restores
//!
//! [`engines`] composes them into one strategy per engine type and
//! [`driver::Driver`] runs a pass over the selected mounts.

pub mod chunk;
pub mod codec;
pub mod context;
pub mod driver;
pub mod engines;
pub mod keyspace;
pub mod mapping;
pub mod transfer;
pub mod versioned;
pub mod walker;

pub use context::EngineContext;
pub use driver::{discover_engine_dirs, Driver, EngineDir, MountReport, RunReport};
pub use engines::{new_engine, Engine};
pub use keyspace::Keyspace;
