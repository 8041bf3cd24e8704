//! Transit mounts, through the engine's own backup/restore endpoints

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::transfer::{self, mount_path};
use crate::walker;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use vaultkeep_core::types::{key_path, EngineType, Payload};
use vaultkeep_core::Result;

pub struct TransitEngine;

fn export_settings() -> Payload {
    let mut body = Payload::new();
    body.insert("allow_plaintext_backup".into(), json!(true));
    body.insert("exportable".into(), json!(true));
    body
}

#[async_trait]
impl Engine for TransitEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Transit
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        debug!("Start backup keys");
        let keys = walker::remote_walk(ctx.store(), Keyspace::Logical, &ctx.mount.path, "keys").await?;

        for key in &keys {
            let config = mount_path(ctx, &key_path::join(&[key, "config"]));
            debug!("Enable exportable for key {}", config);
            ctx.store().write_secret(&config, &export_settings()).await?;

            let backup = mount_path(ctx, &key_path::join(&["backup", key_path::base_name(key)]));
            debug!("Read backup key endpoint {}", backup);
            let data = ctx.store().read_secret(&backup, None).await?;
            transfer::write_response(ctx, key, &data).await?;
        }
        Ok(keys.len())
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        debug!("Start restore keys");
        let files = transfer::local_files(ctx, "keys")?;
        for file in &files {
            let payload: Payload = transfer::read_decoded(ctx, file).await?;
            let path = mount_path(ctx, &key_path::join(&["restore", key_path::base_name(file)]));
            debug!("Write data to vault {}", path);
            ctx.store().write_secret(&path, &payload).await?;
        }
        Ok(files.len())
    }
}
