//! Stores consumed by the vaultkeep engines
//!
//! - [`SecretStore`]: the remote secrets service (list/read/write/destroy, raw keyspace, mounts)
//! - [`VaultStore`]: HashiCorp Vault over its HTTP API
//! - [`LocalStore`]: one engine's backup directory on disk
//! - `MemoryStore` (feature `testing`): in-process store for tests

pub mod local;
#[cfg(feature = "testing")]
pub mod memory;
pub mod remote;
pub mod vault;

pub use local::LocalStore;
#[cfg(feature = "testing")]
pub use memory::{MemoryStore, Operation, StoredVersion, VersionedSecret};
pub use remote::SecretStore;
pub use vault::{RetryConfig, VaultConfig, VaultStore};
