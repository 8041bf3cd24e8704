//! One backup/restore strategy per secrets engine type
//!
//! Strategies share the walkers, single-key transfer, chunk writer and
//! versioned reconstructor; each only decides which subtrees to move and how.

mod ad;
mod aws;
mod database;
mod kv;
mod kv2;
mod pki;
mod ssh;
mod totp;
mod transit;

pub use ad::AdEngine;
pub use aws::AwsEngine;
pub use database::DatabaseEngine;
pub use kv::KvEngine;
pub use kv2::Kv2Engine;
pub use pki::PkiEngine;
pub use ssh::SshEngine;
pub use totp::TotpEngine;
pub use transit::TransitEngine;

use crate::context::EngineContext;
use async_trait::async_trait;
use vaultkeep_core::types::EngineType;
use vaultkeep_core::{Error, Result};

/// Backup and restore of one mounted engine
#[async_trait]
pub trait Engine: Send + Sync {
    fn engine_type(&self) -> EngineType;

    /// Copy the engine's state into `ctx.local`. Returns the number of keys saved.
    async fn backup(&self, ctx: &EngineContext) -> Result<usize>;

    /// Write the state in `ctx.local` back to the mount. Returns the number of keys written.
    async fn restore(&self, ctx: &EngineContext) -> Result<usize>;
}

/// Create the strategy for an engine type
pub fn new_engine(engine_type: &EngineType) -> Result<Box<dyn Engine>> {
    match engine_type {
        EngineType::Ad => Ok(Box::new(AdEngine)),
        EngineType::Aws => Ok(Box::new(AwsEngine)),
        EngineType::Database => Ok(Box::new(DatabaseEngine)),
        EngineType::Pki => Ok(Box::new(PkiEngine)),
        EngineType::Ssh => Ok(Box::new(SshEngine)),
        EngineType::KvV1 => Ok(Box::new(KvEngine)),
        EngineType::KvV2 => Ok(Box::new(Kv2Engine)),
        EngineType::Totp => Ok(Box::new(TotpEngine)),
        EngineType::Transit => Ok(Box::new(TransitEngine)),
        EngineType::Unsupported(name) => Err(Error::validation(format!(
            "Engine type '{}' is not supported",
            name
        ))),
    }
}
