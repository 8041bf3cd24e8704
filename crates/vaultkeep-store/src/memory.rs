//! In-process [`SecretStore`] for tests
//!
//! Emulates enough of Vault to exercise every engine: plain logical paths,
//! versioned kv mounts (`data/`, `metadata/`, destroy), the raw keyspace and
//! the mount table. Every mutating call is appended to an operation log.

use crate::remote::SecretStore;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use vaultkeep_core::types::{key_path, EngineMount, EngineType, Payload, RawEncoding, RawEntry};
use vaultkeep_core::{Error, Result};

/// Deletion timestamp reported for soft-deleted versions
const DELETION_TIME: &str = "2024-01-01T00:00:00Z";

/// A mutating call observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Plain logical write
    Write { path: String },
    /// New version of a versioned secret (`mount/key`)
    WriteVersion { secret: String, version: u64 },
    /// Metadata update of a versioned secret
    WriteMetadata { secret: String },
    /// Destroy call on a versioned secret
    Destroy { secret: String, versions: Vec<u64> },
    RawWrite { path: String },
}

/// One stored version of a versioned secret
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVersion {
    pub data: Payload,
    pub destroyed: bool,
    pub deleted: bool,
}

impl StoredVersion {
    pub fn live(data: Payload) -> Self {
        Self {
            data,
            destroyed: false,
            deleted: false,
        }
    }

    pub fn destroyed() -> Self {
        Self {
            data: Payload::new(),
            destroyed: true,
            deleted: false,
        }
    }

    pub fn deleted(data: Payload) -> Self {
        Self {
            data,
            destroyed: false,
            deleted: true,
        }
    }
}

/// A versioned secret as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedSecret {
    pub versions: Vec<StoredVersion>,
    pub max_versions: u64,
    pub cas_required: bool,
    pub delete_version_after: String,
    pub custom_metadata: Option<BTreeMap<String, String>>,
}

impl VersionedSecret {
    pub fn new(versions: Vec<StoredVersion>) -> Self {
        Self {
            versions,
            max_versions: 0,
            cas_required: false,
            delete_version_after: "0s".to_string(),
            custom_metadata: None,
        }
    }

    pub fn current_version(&self) -> u64 {
        self.versions.len() as u64
    }

    fn metadata(&self) -> Payload {
        let versions: serde_json::Map<String, Value> = self
            .versions
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let deletion_time = if v.deleted { DELETION_TIME } else { "" };
                (
                    (i + 1).to_string(),
                    json!({ "destroyed": v.destroyed, "deletion_time": deletion_time }),
                )
            })
            .collect();

        let value = json!({
            "cas_required": self.cas_required,
            "max_versions": self.max_versions,
            "delete_version_after": self.delete_version_after,
            "custom_metadata": self.custom_metadata,
            "current_version": self.current_version(),
            "versions": versions,
        });
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }
}

#[derive(Default)]
struct State {
    mounts: Vec<EngineMount>,
    logical: BTreeMap<String, Payload>,
    versioned: BTreeMap<String, VersionedSecret>,
    raw: BTreeMap<String, String>,
    failing: BTreeSet<String>,
    log: Vec<Operation>,
}

/// Where a logical path lands inside a versioned mount
enum Route {
    Data(String),
    Metadata(String),
    Plain,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_mount(self, mount: EngineMount) -> Self {
        self.lock().mounts.push(mount);
        self
    }

    /// Seed a plain logical value
    pub fn put_secret(&self, path: &str, data: Payload) {
        self.lock().logical.insert(key_path::join(&[path]), data);
    }

    /// Seed a versioned secret under a versioned mount
    pub fn put_versioned(&self, mount: &str, key: &str, secret: VersionedSecret) {
        self.lock()
            .versioned
            .insert(key_path::join(&[mount, key]), secret);
    }

    /// Seed a raw keyspace value
    pub fn put_raw(&self, path: &str, value: &str) {
        self.lock()
            .raw
            .insert(key_path::join(&[path]), value.to_string());
    }

    /// Make every request touching `path` fail with a 500
    pub fn fail_on(&self, path: &str) {
        self.lock().failing.insert(key_path::join(&[path]));
    }

    pub fn secret(&self, path: &str) -> Option<Payload> {
        self.lock().logical.get(&key_path::join(&[path])).cloned()
    }

    pub fn secret_paths(&self) -> Vec<String> {
        self.lock().logical.keys().cloned().collect()
    }

    pub fn versioned(&self, mount: &str, key: &str) -> Option<VersionedSecret> {
        self.lock()
            .versioned
            .get(&key_path::join(&[mount, key]))
            .cloned()
    }

    pub fn raw(&self, path: &str) -> Option<String> {
        self.lock().raw.get(&key_path::join(&[path])).cloned()
    }

    pub fn raw_paths(&self) -> Vec<String> {
        self.lock().raw.keys().cloned().collect()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.lock().log.clone()
    }

    fn check_failing(state: &State, path: &str) -> Result<()> {
        if state.failing.contains(path) {
            return Err(Error::remote(path, 500, "injected failure"));
        }
        Ok(())
    }

    fn route(state: &State, path: &str) -> Route {
        for mount in &state.mounts {
            if mount.engine_type != EngineType::KvV2 {
                continue;
            }
            let Some(rest) = path.strip_prefix(&format!("{}/", mount.path)) else {
                continue;
            };
            if let Some(key) = rest.strip_prefix("data/") {
                return Route::Data(key_path::join(&[&mount.path, key]));
            }
            if let Some(key) = rest.strip_prefix("metadata/") {
                return Route::Metadata(key_path::join(&[&mount.path, key]));
            }
            if rest == "metadata" {
                return Route::Metadata(mount.path.clone());
            }
        }
        Route::Plain
    }
}

/// Immediate children of `prefix` among `keys`, directories suffixed with `/`
fn children<'a>(keys: impl Iterator<Item = &'a String>, prefix: &str) -> Vec<String> {
    let prefix = key_path::join(&[prefix]);
    let mut out = BTreeSet::new();
    for key in keys {
        let rest = if prefix.is_empty() {
            key.as_str()
        } else {
            match key.strip_prefix(&format!("{}/", prefix)) {
                Some(rest) => rest,
                None => continue,
            }
        };
        match rest.split_once('/') {
            Some((dir, _)) => out.insert(format!("{}/", dir)),
            None => out.insert(rest.to_string()),
        };
    }
    out.into_iter().collect()
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn list_children(&self, path: &str) -> Result<Vec<String>> {
        let path = key_path::join(&[path]);
        let state = self.lock();
        Self::check_failing(&state, &path)?;

        let entries = match Self::route(&state, &path) {
            Route::Metadata(prefix) => children(state.versioned.keys(), &prefix),
            Route::Data(_) | Route::Plain => children(state.logical.keys(), &path),
        };

        if entries.is_empty() {
            return Err(Error::not_found(path));
        }
        Ok(entries)
    }

    async fn read_secret(&self, path: &str, version: Option<u64>) -> Result<Payload> {
        let path = key_path::join(&[path]);
        let state = self.lock();
        Self::check_failing(&state, &path)?;

        match Self::route(&state, &path) {
            Route::Data(secret) => {
                let stored = state
                    .versioned
                    .get(&secret)
                    .ok_or_else(|| Error::not_found(&path))?;
                let number = version.unwrap_or_else(|| stored.current_version());
                let v = number
                    .checked_sub(1)
                    .and_then(|i| stored.versions.get(i as usize))
                    .ok_or_else(|| Error::not_found(&path))?;
                if v.destroyed || v.deleted {
                    return Err(Error::not_found(&path));
                }
                let value = json!({
                    "data": v.data,
                    "metadata": { "version": number, "destroyed": false, "deletion_time": "" },
                });
                match value {
                    Value::Object(map) => Ok(map),
                    _ => Err(Error::decode(&path, "not an object")),
                }
            }
            Route::Metadata(secret) => state
                .versioned
                .get(&secret)
                .map(VersionedSecret::metadata)
                .ok_or_else(|| Error::not_found(&path)),
            Route::Plain => state
                .logical
                .get(&path)
                .cloned()
                .ok_or_else(|| Error::not_found(&path)),
        }
    }

    async fn write_secret(&self, path: &str, data: &Payload) -> Result<()> {
        let path = key_path::join(&[path]);
        let mut state = self.lock();
        Self::check_failing(&state, &path)?;

        match Self::route(&state, &path) {
            Route::Data(secret) => {
                let payload = match data.get("data") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Payload::new(),
                };
                let cas = data
                    .get("options")
                    .and_then(|o| o.get("cas"))
                    .and_then(Value::as_u64);
                let stored = state
                    .versioned
                    .entry(secret.clone())
                    .or_insert_with(|| VersionedSecret::new(Vec::new()));
                match cas {
                    None if stored.cas_required => {
                        return Err(Error::remote(
                            &path,
                            400,
                            "check-and-set parameter required for this call",
                        ));
                    }
                    Some(expected) if expected != stored.current_version() => {
                        return Err(Error::remote(
                            &path,
                            400,
                            "check-and-set parameter did not match the current version",
                        ));
                    }
                    _ => {}
                }
                stored.versions.push(StoredVersion::live(payload));
                let version = stored.current_version();
                state.log.push(Operation::WriteVersion { secret, version });
            }
            Route::Metadata(secret) => {
                let stored = state.versioned.get_mut(&secret).ok_or_else(|| {
                    Error::remote(&path, 400, "no versions exist for this secret")
                })?;
                if let Some(v) = data.get("max_versions").and_then(Value::as_u64) {
                    stored.max_versions = v;
                }
                if let Some(v) = data.get("cas_required").and_then(Value::as_bool) {
                    stored.cas_required = v;
                }
                if let Some(v) = data.get("delete_version_after").and_then(Value::as_str) {
                    stored.delete_version_after = v.to_string();
                }
                if let Some(v) = data.get("custom_metadata") {
                    stored.custom_metadata = serde_json::from_value(v.clone())?;
                }
                state.log.push(Operation::WriteMetadata { secret });
            }
            Route::Plain => {
                state.logical.insert(path.clone(), data.clone());
                state.log.push(Operation::Write { path });
            }
        }
        Ok(())
    }

    async fn destroy_versions(&self, mount: &str, key: &str, versions: &[u64]) -> Result<()> {
        let secret = key_path::join(&[mount, key]);
        let mut state = self.lock();
        Self::check_failing(&state, &secret)?;

        let stored = state
            .versioned
            .get_mut(&secret)
            .ok_or_else(|| Error::not_found(&secret))?;
        for v in versions {
            if let Some(version) = v.checked_sub(1).and_then(|i| stored.versions.get_mut(i as usize)) {
                version.destroyed = true;
                version.data = Payload::new();
            }
        }
        state.log.push(Operation::Destroy {
            secret,
            versions: versions.to_vec(),
        });
        Ok(())
    }

    async fn read_raw_key(&self, path: &str) -> Result<RawEntry> {
        let path = key_path::join(&[path]);
        let state = self.lock();
        Self::check_failing(&state, &path)?;

        match state.raw.get(&path) {
            Some(value) if value.is_empty() => Err(Error::empty_value(&path)),
            Some(value) => Ok(RawEntry::plain(value.clone())),
            None => Err(Error::not_found(&path)),
        }
    }

    async fn write_raw_key(&self, path: &str, entry: &RawEntry) -> Result<()> {
        let path = key_path::join(&[path]);
        let mut state = self.lock();
        Self::check_failing(&state, &path)?;

        let value = match entry.encoding {
            RawEncoding::Plain => entry.value.clone(),
            RawEncoding::Base64 => {
                let bytes = STANDARD
                    .decode(entry.value.trim())
                    .map_err(|e| Error::remote(&path, 400, e.to_string()))?;
                String::from_utf8(bytes).map_err(|e| Error::remote(&path, 400, e.to_string()))?
            }
        };
        state.raw.insert(path.clone(), value);
        state.log.push(Operation::RawWrite { path });
        Ok(())
    }

    async fn list_raw_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = key_path::join(&[prefix]);
        let state = self.lock();
        Self::check_failing(&state, &prefix)?;

        let entries = children(state.raw.keys(), &prefix);
        if entries.is_empty() {
            return Err(Error::not_found(prefix));
        }
        Ok(entries)
    }

    async fn list_mounted_engines(&self) -> Result<Vec<EngineMount>> {
        Ok(self.lock().mounts.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
