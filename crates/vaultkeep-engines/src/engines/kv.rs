//! Unversioned key/value mounts

use super::Engine;
use crate::chunk::{self, ChunkWriter};
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::transfer::mount_path;
use crate::walker;
use async_trait::async_trait;
use tracing::{debug, info, warn};
use vaultkeep_core::types::{EngineType, Payload};
use vaultkeep_core::Result;

/// Packs the whole mount into chunk files
pub struct KvEngine;

#[async_trait]
impl Engine for KvEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::KvV1
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        info!("Start backup of key/value mount {}", ctx.mount.path);
        let keys = walker::remote_walk(ctx.store(), Keyspace::Logical, &ctx.mount.path, "").await?;

        let mut writer = ChunkWriter::new(&ctx.local, ctx.options.chunk_size);
        for key in keys {
            let path = mount_path(ctx, &key);
            debug!("Backup key {}", path);
            match ctx.store().read_secret(&path, None).await {
                Ok(data) => writer.push(&key, &data).await?,
                Err(e) if e.is_not_found() => debug!("Key vanished, skipping: {}", path),
                Err(e) => return Err(e),
            }
        }

        let summary = writer.finish().await?;
        debug!("Wrote {} keys in {} chunk files", summary.keys, summary.files);
        Ok(summary.keys)
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        info!("Start restore of key/value mount {}", ctx.mount.path);
        let entries: Vec<(String, Payload)> = match chunk::read_all_entries(&ctx.local).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                warn!("No backup found in {}", ctx.local.root());
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        for (key, payload) in &entries {
            let path = mount_path(ctx, key);
            debug!("Write data to vault key {}", path);
            ctx.store().write_secret(&path, payload).await?;
        }
        Ok(entries.len())
    }
}
