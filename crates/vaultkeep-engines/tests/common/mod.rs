//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use camino::Utf8PathBuf;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use vaultkeep_core::types::{EngineMount, EngineType, Payload, RunOptions};
use vaultkeep_engines::EngineContext;
use vaultkeep_store::MemoryStore;

pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

pub fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

/// Store with a single mount registered
pub fn store_with(mount: &EngineMount) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_mount(mount.clone()))
}

pub fn context(
    store: Arc<MemoryStore>,
    mount: &EngineMount,
    dir: &TempDir,
    options: RunOptions,
) -> EngineContext {
    let root = utf8_root(dir).join(mount.backup_dir_name());
    EngineContext::new(store, mount.clone(), root, options)
}

pub fn raw_options() -> RunOptions {
    RunOptions {
        raw: true,
        ..RunOptions::default()
    }
}

pub fn kv2_mount() -> EngineMount {
    EngineMount::new("secret", EngineType::KvV2, "kv2-uuid")
}
