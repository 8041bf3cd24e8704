//! Single-key transfer between the remote store and local files

use crate::codec;
use crate::context::EngineContext;
use crate::keyspace::{self, Keyspace};
use crate::walker;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use vaultkeep_core::types::{key_path, Payload};
use vaultkeep_core::{Error, Result};

/// Copy one key from the remote store into its local file.
///
/// `key` is relative to the keyspace root and doubles as the local path.
/// Returns whether a file was written: keys that were never written remotely
/// are skipped.
pub async fn backup_key(ctx: &EngineContext, keyspace: Keyspace, key: &str) -> Result<bool> {
    let remote = keyspace.address(&ctx.mount, key);
    let content = match keyspace {
        Keyspace::Logical => {
            debug!("Read data from vault: {}", remote);
            match ctx.store().read_secret(&remote, None).await {
                Ok(data) => codec::encode_json(&data)?,
                Err(e) if e.is_not_found() => {
                    debug!("Key has no data, skipping: {}", remote);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }
        Keyspace::Raw => {
            debug!("Read raw data: {}", remote);
            match ctx.store().read_raw_key(&remote).await {
                Ok(entry) => keyspace::encode_raw(&entry, ctx.options.base64_encode),
                Err(e) if e.is_empty_value() || e.is_not_found() => {
                    debug!("Raw key is empty, skipping: {}", remote);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }
    };

    ctx.local.write(key, content.as_bytes()).await?;
    Ok(true)
}

/// Write one local file back to its remote key.
pub async fn restore_key(ctx: &EngineContext, keyspace: Keyspace, key: &str) -> Result<()> {
    let remote = keyspace.address(&ctx.mount, key);
    match keyspace {
        Keyspace::Logical => {
            let payload: Payload = read_decoded(ctx, key).await?;
            debug!("Write data to vault: {}", remote);
            ctx.store().write_secret(&remote, &payload).await
        }
        Keyspace::Raw => {
            let content = ctx.local.read_to_string(key).await?;
            let entry = keyspace::decode_raw(content, ctx.options.base64_encode);
            debug!("Write raw data: {}", remote);
            ctx.store().write_raw_key(&remote, &entry).await
        }
    }
}

/// Back up every key below `start`. Returns the number of files written.
pub async fn backup_tree(ctx: &EngineContext, keyspace: Keyspace, start: &str) -> Result<usize> {
    let root = keyspace.root(&ctx.mount);
    let keys = walker::remote_walk(ctx.store(), keyspace, &root, start).await?;

    let mut written = 0;
    for key in keys {
        if backup_key(ctx, keyspace, &key).await? {
            written += 1;
        }
    }
    Ok(written)
}

/// Restore every local file below `start`. A missing directory is a warning.
pub async fn restore_tree(ctx: &EngineContext, keyspace: Keyspace, start: &str) -> Result<usize> {
    let files = local_files(ctx, start)?;
    for file in &files {
        restore_key(ctx, keyspace, file).await?;
    }
    Ok(files.len())
}

/// Local files below `start`; a missing directory logs a warning and is empty
pub fn local_files(ctx: &EngineContext, start: &str) -> Result<Vec<String>> {
    match walker::local_walk(&ctx.local, start) {
        Ok(files) => Ok(files),
        Err(e) if e.is_not_found() => {
            warn!("Nothing to restore under {}", ctx.local.path_of(start));
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Read a local file holding base64(JSON) and decode it
pub async fn read_decoded<T: DeserializeOwned>(ctx: &EngineContext, key: &str) -> Result<T> {
    let content = ctx.local.read_to_string(key).await?;
    codec::decode_json(ctx.local.path_of(key).as_str(), &content)
}

/// Read a decoded local file, or `None` when it does not exist
pub async fn read_decoded_opt<T: DeserializeOwned>(
    ctx: &EngineContext,
    key: &str,
) -> Result<Option<T>> {
    match read_decoded(ctx, key).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Decode a JSON record that was backed up from the raw keyspace.
///
/// Raw files are base64-wrapped unless the run disabled it. `None` when the
/// file does not exist.
pub async fn read_raw_record<T: DeserializeOwned>(
    ctx: &EngineContext,
    key: &str,
) -> Result<Option<T>> {
    let content = match ctx.local.read_to_string(key).await {
        Ok(content) => content,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    let origin = ctx.local.path_of(key);
    let bytes = if ctx.options.base64_encode {
        codec::decode_bytes(origin.as_str(), &content)?
    } else {
        content.into_bytes()
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| Error::decode(origin.as_str(), e))
}

/// Persist a remote response as base64(JSON) under `key`
pub async fn write_response(ctx: &EngineContext, key: &str, data: &Payload) -> Result<()> {
    let content = codec::encode_json(data)?;
    ctx.local.write(key, content.as_bytes()).await
}

/// Logical path of a key under the mount
pub fn mount_path(ctx: &EngineContext, rel: &str) -> String {
    key_path::join(&[&ctx.mount.path, rel])
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde_json::json;
    use std::sync::Arc;
    use vaultkeep_core::types::{EngineMount, EngineType, RunOptions};
    use vaultkeep_store::MemoryStore;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn context(store: Arc<MemoryStore>, dir: &tempfile::TempDir, raw: bool) -> EngineContext {
        let root = Utf8PathBuf::from_path_buf(dir.path().join("ssh.ssh")).unwrap();
        let options = RunOptions {
            raw,
            ..RunOptions::default()
        };
        EngineContext::new(
            store,
            EngineMount::new("ssh", EngineType::Ssh, "u1"),
            root,
            options,
        )
    }

    #[tokio::test]
    async fn test_logical_key_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemoryStore::new());
        source.put_secret("ssh/roles/web", payload(json!({"key_type": "ca", "ttl": 60})));

        let ctx = context(source, &dir, false);
        assert_eq!(backup_tree(&ctx, Keyspace::Logical, "roles").await.unwrap(), 1);

        let target = Arc::new(MemoryStore::new());
        let ctx = context(target.clone(), &dir, false);
        assert_eq!(restore_tree(&ctx, Keyspace::Logical, "roles").await.unwrap(), 1);
        assert_eq!(
            target.secret("ssh/roles/web").unwrap(),
            payload(json!({"key_type": "ca", "ttl": 60}))
        );
    }

    #[tokio::test]
    async fn test_empty_raw_value_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put_raw("logical/u1/config/empty", "");
        store.put_raw("logical/u1/config/ca_public_key", "{\"key\":\"pub\"}");

        let ctx = context(store, &dir, true);
        assert_eq!(backup_tree(&ctx, Keyspace::Raw, "config").await.unwrap(), 1);
        assert!(!ctx.local.exists("config/empty"));
        assert!(ctx.local.exists("config/ca_public_key"));
    }

    #[tokio::test]
    async fn test_raw_restore_writes_file_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemoryStore::new());
        source.put_raw("logical/u1/config/ca_public_key", "{\"key\":\"pub\"}");
        let ctx = context(source, &dir, true);
        backup_tree(&ctx, Keyspace::Raw, "").await.unwrap();

        let target = Arc::new(MemoryStore::new());
        let ctx = context(target.clone(), &dir, true);
        restore_tree(&ctx, Keyspace::Raw, "").await.unwrap();
        assert_eq!(
            target.raw("logical/u1/config/ca_public_key").as_deref(),
            Some("{\"key\":\"pub\"}")
        );
    }

    #[tokio::test]
    async fn test_restore_of_missing_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let ctx = context(store.clone(), &dir, false);
        assert_eq!(restore_tree(&ctx, Keyspace::Logical, "roles").await.unwrap(), 0);
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_read_raw_record_honours_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put_raw("logical/u1/config/ca_public_key", "{\"key\":\"pub\"}");

        let ctx = context(store.clone(), &dir, true);
        backup_tree(&ctx, Keyspace::Raw, "config").await.unwrap();
        let record: Option<Payload> = read_raw_record(&ctx, "config/ca_public_key").await.unwrap();
        assert_eq!(record.unwrap()["key"], "pub");

        let missing: Option<Payload> = read_raw_record(&ctx, "config/ca_private_key").await.unwrap();
        assert!(missing.is_none());

        let mut ctx = context(store, &dir, true);
        ctx.options.base64_encode = false;
        ctx.local.write("config/plain", b"{\"key\":\"x\"}").await.unwrap();
        let record: Option<Payload> = read_raw_record(&ctx, "config/plain").await.unwrap();
        assert_eq!(record.unwrap()["key"], "x");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let ctx = context(store, &dir, false);
        ctx.local.write("roles/web", b"%%%").await.unwrap();

        let err = restore_key(&ctx, Keyspace::Logical, "roles/web").await.unwrap_err();
        assert!(matches!(err, vaultkeep_core::Error::Decode { .. }));
    }
}
