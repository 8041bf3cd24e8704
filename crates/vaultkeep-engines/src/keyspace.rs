//! Addressing and encoding rules for the two remote keyspaces
//!
//! The logical keyspace is an engine's public API under its mount path; values
//! are structured and stored locally as base64(JSON). The raw keyspace is the
//! engine's internal storage under `logical/<uuid>`; values are opaque strings
//! stored base64-wrapped (or verbatim) and written back unchanged.

use crate::codec;
use vaultkeep_core::types::{key_path, EngineMount, RawEncoding, RawEntry};
use vaultkeep_core::Result;
use vaultkeep_store::SecretStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyspace {
    Logical,
    Raw,
}

impl Keyspace {
    /// Root path of a mount in this keyspace
    pub fn root(&self, mount: &EngineMount) -> String {
        match self {
            Keyspace::Logical => mount.path.clone(),
            Keyspace::Raw => mount.raw_prefix(),
        }
    }

    /// Full remote path of a key relative to the mount
    pub fn address(&self, mount: &EngineMount, key: &str) -> String {
        key_path::join(&[&self.root(mount), key])
    }

    /// List immediate children of a full remote path
    pub async fn list(&self, store: &dyn SecretStore, path: &str) -> Result<Vec<String>> {
        match self {
            Keyspace::Logical => store.list_children(path).await,
            Keyspace::Raw => store.list_raw_keys(path).await,
        }
    }
}

/// Local file content for a raw value
pub fn encode_raw(entry: &RawEntry, base64_encode: bool) -> String {
    if base64_encode {
        codec::encode_bytes(entry.value.as_bytes())
    } else {
        entry.value.clone()
    }
}

/// Raw value to write back for local file content, sent verbatim
pub fn decode_raw(content: String, base64_encode: bool) -> RawEntry {
    RawEntry {
        value: content,
        encoding: if base64_encode {
            RawEncoding::Base64
        } else {
            RawEncoding::Plain
        },
    }
}
