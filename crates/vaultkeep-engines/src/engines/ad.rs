//! Active Directory mounts: single config record and roles

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::mapping::AD_CONFIG;
use crate::transfer::{self, mount_path};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use vaultkeep_core::types::{EngineType, Payload};
use vaultkeep_core::Result;

const CONFIG_KEY: &str = "config";

pub struct AdEngine;

#[async_trait]
impl Engine for AdEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Ad
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        let mut saved = 0;
        if ctx.raw_enabled() {
            debug!("Start backup config");
            if transfer::backup_key(ctx, Keyspace::Raw, CONFIG_KEY).await? {
                saved += 1;
            }
        }

        debug!("Start backup roles");
        saved += transfer::backup_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(saved)
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        let mut written = 0;
        match transfer::read_raw_record::<Payload>(ctx, CONFIG_KEY).await? {
            Some(config) => {
                info!("Restore AD configuration");
                let body = AD_CONFIG.apply(CONFIG_KEY, &config)?;
                ctx.store()
                    .write_secret(&mount_path(ctx, CONFIG_KEY), &body)
                    .await?;
                written += 1;
            }
            None => warn!("No config file found, skip restore AD configuration"),
        }

        debug!("Start restore roles");
        written += transfer::restore_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(written)
    }
}
