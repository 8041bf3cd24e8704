//! Capture and replay of versioned secret history
//!
//! A versioned mount only creates versions by incrementing, one write at a
//! time, so a history like "v2 destroyed, v3 live" can only be reproduced by
//! writing every version in order and destroying afterwards. Replay therefore
//! writes `1..=current_version` strictly ascending, pushes the metadata right
//! after version 1 exists, and issues a single destroy call at the end.
//!
//! Version-creating writes are not idempotent. A failed replay leaves the key
//! partially restored and must not be blindly retried.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;
use vaultkeep_core::types::{key_path, EngineMount, Payload};
use vaultkeep_core::{Error, Result};
use vaultkeep_store::SecretStore;

/// Per-version flags from the metadata endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionState {
    pub destroyed: bool,
    pub deletion_time: String,
}

impl VersionState {
    /// Destroyed or soft-deleted; the payload cannot be read back
    pub fn is_gone(&self) -> bool {
        self.destroyed || !self.deletion_time.is_empty()
    }
}

/// Metadata of one versioned secret
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionedMetadata {
    pub max_versions: u64,
    pub cas_required: bool,
    pub delete_version_after: String,
    pub custom_metadata: Option<BTreeMap<String, String>>,
    pub current_version: u64,
    pub versions: BTreeMap<u64, VersionState>,
}

/// Stored record of a versioned secret: metadata plus every version's payload.
///
/// Destroyed and deleted versions hold an empty payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionedBackup {
    pub metadata: VersionedMetadata,
    #[serde(default)]
    pub data: BTreeMap<u64, Payload>,
}

impl VersionedBackup {
    /// Versions to destroy once replay has written them all.
    ///
    /// A version with no metadata entry was pruned at the source, so it is
    /// destroyed too.
    pub fn pending_destroy(&self) -> Vec<u64> {
        (1..=self.metadata.current_version)
            .filter(|v| {
                self.metadata
                    .versions
                    .get(v)
                    .map_or(true, VersionState::is_gone)
            })
            .collect()
    }

    /// Body for the metadata write.
    ///
    /// `custom_metadata` is left out when the source had none so the
    /// destination keeps its default.
    pub fn settings_payload(&self) -> Payload {
        let mut body = Payload::new();
        body.insert("max_versions".into(), json!(self.metadata.max_versions));
        body.insert("cas_required".into(), json!(self.metadata.cas_required));
        body.insert(
            "delete_version_after".into(),
            json!(self.metadata.delete_version_after),
        );
        if let Some(custom) = &self.metadata.custom_metadata {
            body.insert("custom_metadata".into(), json!(custom));
        }
        body
    }
}

/// What replaying one key did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub versions: u64,
    pub destroyed: Vec<u64>,
}

fn data_path(mount: &EngineMount, key: &str) -> String {
    key_path::join(&[&mount.path, "data", key])
}

fn metadata_path(mount: &EngineMount, key: &str) -> String {
    key_path::join(&[&mount.path, "metadata", key])
}

/// Read the full history of `key` from a versioned mount
pub async fn capture(
    store: &dyn SecretStore,
    mount: &EngineMount,
    key: &str,
) -> Result<VersionedBackup> {
    let meta_path = metadata_path(mount, key);
    debug!("Read metadata: {}", meta_path);
    let raw = store.read_secret(&meta_path, None).await?;
    let metadata: VersionedMetadata =
        serde_json::from_value(Value::Object(raw)).map_err(|e| Error::decode(&meta_path, e))?;

    let path = data_path(mount, key);
    let mut data = BTreeMap::new();
    // BTreeMap keys iterate in ascending version order
    for (&version, state) in &metadata.versions {
        if state.is_gone() {
            debug!("Version {} of {} is gone, recording placeholder", version, key);
            data.insert(version, Payload::new());
            continue;
        }

        debug!("Read version {} of {}", version, path);
        let response = store.read_secret(&path, Some(version)).await?;
        let payload = match response.get("data") {
            Some(Value::Object(map)) => map.clone(),
            _ => Payload::new(),
        };
        data.insert(version, payload);
    }

    Ok(VersionedBackup { metadata, data })
}

/// Recreate `key` on a mount with no prior versions of it
pub async fn replay(
    store: &dyn SecretStore,
    mount: &EngineMount,
    key: &str,
    backup: &VersionedBackup,
) -> Result<ReplaySummary> {
    let path = data_path(mount, key);
    let current = backup.metadata.current_version;

    for version in 1..=current {
        let payload = backup.data.get(&version).cloned().unwrap_or_default();
        let mut body = Payload::new();
        body.insert("data".into(), Value::Object(payload));
        // the destination counter sits at version - 1 before this write
        body.insert("options".into(), json!({ "cas": version - 1 }));

        debug!("Write version {} of {}", version, path);
        store.write_secret(&path, &body).await?;

        if version == 1 {
            let meta_path = metadata_path(mount, key);
            debug!("Write metadata: {}", meta_path);
            store
                .write_secret(&meta_path, &backup.settings_payload())
                .await?;
        }
    }

    let destroyed = backup.pending_destroy();
    if !destroyed.is_empty() {
        debug!("Destroy versions {:?} of {}", destroyed, key);
        store.destroy_versions(&mount.path, key, &destroyed).await?;
    }

    Ok(ReplaySummary {
        versions: current,
        destroyed,
    })
}
