//! Recursive tree walkers over the remote store and the local backup directory

use crate::keyspace::Keyspace;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;
use vaultkeep_core::types::key_path;
use vaultkeep_core::Result;
use vaultkeep_store::{LocalStore, SecretStore};

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

/// Every leaf key below `prefix/start`, as paths relative to `prefix`.
///
/// Entries ending in `/` are descended into. An absent or empty listing
/// yields no keys; any other failure aborts the walk. Keys come back in the
/// order the store lists them.
pub fn remote_walk<'a>(
    store: &'a dyn SecretStore,
    keyspace: Keyspace,
    prefix: &'a str,
    start: &'a str,
) -> WalkFuture<'a> {
    Box::pin(async move {
        let path = key_path::join(&[prefix, start]);
        debug!("List remote path: {}", path);

        let entries = match keyspace.list(store, &path).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                debug!("Path is empty: {}", path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let child = key_path::join(&[start, &entry]);
            if key_path::is_dir_entry(&entry) {
                keys.extend(remote_walk(store, keyspace, prefix, &child).await?);
            } else {
                keys.push(child);
            }
        }
        Ok(keys)
    })
}

/// Every file below `start` in the local backup directory.
///
/// An absent `start` is `NotFound`; callers decide whether that means
/// "nothing to restore".
pub fn local_walk(local: &LocalStore, start: &str) -> Result<Vec<String>> {
    local.walk(start)
}
