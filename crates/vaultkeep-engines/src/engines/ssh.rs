//! SSH mounts: CA key pair and roles

use super::Engine;
use crate::context::EngineContext;
use crate::keyspace::Keyspace;
use crate::mapping::SSH_CA;
use crate::transfer::{self, mount_path};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use vaultkeep_core::types::{EngineType, Payload};
use vaultkeep_core::Result;

const CA_PUBLIC_KEY: &str = "config/ca_public_key";
const CA_PRIVATE_KEY: &str = "config/ca_private_key";

pub struct SshEngine;

#[async_trait]
impl Engine for SshEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Ssh
    }

    async fn backup(&self, ctx: &EngineContext) -> Result<usize> {
        let mut saved = 0;
        if ctx.raw_enabled() {
            debug!("Start backup config");
            saved += transfer::backup_tree(ctx, Keyspace::Raw, "config").await?;
        }

        debug!("Start backup roles");
        saved += transfer::backup_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(saved)
    }

    async fn restore(&self, ctx: &EngineContext) -> Result<usize> {
        let mut written = 0;

        let public: Option<Payload> = transfer::read_raw_record(ctx, CA_PUBLIC_KEY).await?;
        let private: Option<Payload> = transfer::read_raw_record(ctx, CA_PRIVATE_KEY).await?;
        match (public, private) {
            (Some(public), Some(private)) => {
                info!("Start restore SSH config");
                let mut keys = Payload::new();
                keys.insert("public".into(), Value::Object(public));
                keys.insert("private".into(), Value::Object(private));
                let body = SSH_CA.apply(CA_PUBLIC_KEY, &keys)?;
                ctx.store()
                    .write_secret(&mount_path(ctx, "config/ca"), &body)
                    .await?;
                written += 1;
            }
            _ => warn!("Skip restore SSH config, because of missing CA keys"),
        }

        info!("Start restore SSH roles");
        written += transfer::restore_tree(ctx, Keyspace::Logical, "roles").await?;
        Ok(written)
    }
}
