//! PKI mounts, moved wholesale through the raw keyspace

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::transfer;
use async_trait::async_trait;
use tracing::info;
use vaultkeep_core::types::EngineType;
use vaultkeep_core::Result;

pub struct PkiEngine;

#[async_trait]
impl Engine for PkiEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Pki
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        info!("Start backup PKI {}", ctx.mount.path);
        transfer::backup_tree(ctx, Keyspace::Raw, "").await
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        info!("Start restore PKI {}", ctx.mount.path);
        transfer::restore_tree(ctx, Keyspace::Raw, "").await
    }
}
