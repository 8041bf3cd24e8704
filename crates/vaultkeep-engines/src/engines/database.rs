//! Database mounts: connection configs and roles

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::mapping::DATABASE_CONFIG;
use crate::transfer::{self, mount_path};
use async_trait::async_trait;
use tracing::{debug, warn};
use vaultkeep_core::types::{EngineType, Payload};
use vaultkeep_core::Result;

pub struct DatabaseEngine;

#[async_trait]
impl Engine for DatabaseEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Database
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        let mut saved = 0;
        // connection configs are only reachable raw
        if ctx.raw_enabled() {
            debug!("Start backup config");
            saved += transfer::backup_tree(ctx, Keyspace::Raw, "config").await?;
        }

        debug!("Start backup roles");
        saved += transfer::backup_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(saved)
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        debug!("Start restore config");
        let configs = transfer::local_files(ctx, "config")?;
        if configs.is_empty() {
            warn!("No config directory found, skip restore Database configuration");
        }

        let mut written = 0;
        for file in &configs {
            let Some(record) = transfer::read_raw_record::<Payload>(ctx, file).await? else {
                continue;
            };
            let body = DATABASE_CONFIG.apply(file, &record)?;
            let path = mount_path(ctx, file);
            debug!("Write connection config to {}", path);
            ctx.store().write_secret(&path, &body).await?;
            written += 1;
        }

        debug!("Start restore roles");
        let roles = transfer::restore_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(written + roles)
    }
}
