//! Versioned key/value mounts

use super::Engine;
use crate::chunk::{self, ChunkWriter};
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::versioned::{self, VersionedBackup};
use crate::walker;
use async_trait::async_trait;
use tracing::{debug, info, warn};
use vaultkeep_core::types::{key_path, EngineType};
use vaultkeep_core::Result;

/// Captures every secret's full version history and replays it on restore
pub struct Kv2Engine;

#[async_trait]
impl Engine for Kv2Engine {
    fn engine_type(&self) -> EngineType {
        EngineType::KvV2
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        info!("Start backup of versioned mount {}", ctx.mount.path);
        let metadata_root = key_path::join(&[&ctx.mount.path, "metadata"]);
        let keys = walker::remote_walk(ctx.store(), Keyspace::Logical, &metadata_root, "").await?;

        let mut writer = ChunkWriter::new(&ctx.local, ctx.options.chunk_size);
        for key in keys {
            let record = versioned::capture(ctx.store(), &ctx.mount, &key).await?;
            debug!(
                "Captured {} versions of {}",
                record.metadata.current_version, key
            );
            writer.push(&key, &record).await?;
        }

        Ok(writer.finish().await?.keys)
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        info!("Start restore of versioned mount {}", ctx.mount.path);
        let records: Vec<(String, VersionedBackup)> =
            match chunk::read_all_entries(&ctx.local).await {
                Ok(records) => records,
                Err(e) if e.is_not_found() => {
                    warn!("No backup found in {}", ctx.local.root());
                    return Ok(0);
                }
                Err(e) => return Err(e),
            };

        for (key, record) in &records {
            let summary = versioned::replay(ctx.store(), &ctx.mount, key, record).await?;
            debug!(
                "Replayed {} versions of {}, destroyed {:?}",
                summary.versions, key, summary.destroyed
            );
        }
        Ok(records.len())
    }
}
