//! AWS mounts: root credentials, lease settings and roles

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::transfer::{self, mount_path};
use async_trait::async_trait;
use tracing::{debug, warn};
use vaultkeep_core::types::{EngineType, Payload};
use vaultkeep_core::Result;

const ROOT_CONFIG: &str = "config/root";
const LEASE_CONFIG: &str = "config/lease";

pub struct AwsEngine;

#[async_trait]
impl Engine for AwsEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Aws
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        let mut saved = 0;
        if ctx.raw_enabled() {
            debug!("Start backup configuration");
            saved += transfer::backup_tree(ctx, Keyspace::Raw, "config").await?;
        }

        debug!("Start backup lease time");
        match ctx.store().read_secret(&mount_path(ctx, LEASE_CONFIG), None).await {
            Ok(data) => {
                transfer::write_response(ctx, LEASE_CONFIG, &data).await?;
                saved += 1;
            }
            Err(e) if e.is_not_found() => debug!("No lease configuration set"),
            Err(e) => return Err(e),
        }

        debug!("Start backup roles");
        saved += transfer::backup_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(saved)
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        let mut written = 0;

        debug!("Start restore root configuration");
        match transfer::read_raw_record::<Payload>(ctx, ROOT_CONFIG).await? {
            Some(root) => {
                ctx.store()
                    .write_secret(&mount_path(ctx, ROOT_CONFIG), &root)
                    .await?;
                written += 1;
            }
            None => warn!("Root configuration not found, skip restore root configuration"),
        }

        debug!("Start restore lease configuration");
        match transfer::read_decoded_opt::<Payload>(ctx, LEASE_CONFIG).await? {
            Some(lease) => {
                ctx.store()
                    .write_secret(&mount_path(ctx, LEASE_CONFIG), &lease)
                    .await?;
                written += 1;
            }
            None => warn!("Lease configuration not found, skip restore lease configuration"),
        }

        debug!("Start restore roles");
        written += transfer::restore_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(written)
    }
}
