//! Remote secret store interface

use async_trait::async_trait;
use vaultkeep_core::types::{EngineMount, Payload, RawEntry};
use vaultkeep_core::Result;

/// Operations the backup engines consume from the remote secrets service.
///
/// Listing entries ending in `/` are directories. An absent path is reported
/// as `Error::NotFound`; a raw key without content as `Error::EmptyValue`.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// List immediate children of a logical path
    async fn list_children(&self, path: &str) -> Result<Vec<String>>;

    /// Read the `data` block at a logical path, optionally at a specific version
    async fn read_secret(&self, path: &str, version: Option<u64>) -> Result<Payload>;

    /// Write to a logical path. For versioned secrets this creates a new version.
    async fn write_secret(&self, path: &str, data: &Payload) -> Result<()>;

    /// Permanently destroy versions of a versioned secret
    async fn destroy_versions(&self, mount: &str, key: &str, versions: &[u64]) -> Result<()>;

    /// Read a value from the raw storage keyspace
    async fn read_raw_key(&self, path: &str) -> Result<RawEntry>;

    /// Write a value to the raw storage keyspace
    async fn write_raw_key(&self, path: &str, entry: &RawEntry) -> Result<()>;

    /// List immediate children in the raw storage keyspace
    async fn list_raw_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// All mounted secrets engines vaultkeep may back up
    async fn list_mounted_engines(&self) -> Result<Vec<EngineMount>>;

    /// Store name for log messages
    fn name(&self) -> &'static str;
}
