//! TOTP mounts, backed up from the raw keyspace only

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::mapping::TOTP_KEY;
use crate::transfer::{self, mount_path};
use async_trait::async_trait;
use tracing::{debug, warn};
use vaultkeep_core::types::{key_path, EngineType, Payload};
use vaultkeep_core::Result;

pub struct TotpEngine;

#[async_trait]
impl Engine for TotpEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Totp
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        if !ctx.raw_enabled() {
            warn!("TOTP backup is not supported without raw mode");
            return Ok(0);
        }
        debug!("Start backup TOTP");
        transfer::backup_tree(ctx, Keyspace::Raw, "key").await
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        debug!("Start restore TOTP");
        let files = transfer::local_files(ctx, "key")?;
        for file in &files {
            let Some(record) = transfer::read_raw_record::<Payload>(ctx, file).await? else {
                continue;
            };
            let body = TOTP_KEY.apply(file, &record)?;
            let path = mount_path(ctx, &key_path::join(&["keys", key_path::base_name(file)]));
            debug!("Restore TOTP key {}", path);
            ctx.store().write_secret(&path, &body).await?;
        }
        Ok(files.len())
    }
}
