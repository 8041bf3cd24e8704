//! Secrets engine mounts and engine types

use crate::error::{Error, Result};
use crate::types::key_path;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix some backup directories carry after the engine type
const RAW_DIR_SUFFIX: &str = "-r";

/// Secrets engine type as understood by the backup engines
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EngineType {
    Ad,
    Aws,
    Database,
    Pki,
    Ssh,
    /// Unversioned key/value store
    KvV1,
    /// Versioned key/value store
    KvV2,
    Totp,
    Transit,
    /// Anything vaultkeep has no strategy for
    Unsupported(String),
}

impl EngineType {
    /// Parse the name used in backup directory suffixes
    pub fn parse(name: &str) -> Self {
        match name {
            "ad" => Self::Ad,
            "aws" => Self::Aws,
            "database" => Self::Database,
            "pki" => Self::Pki,
            "ssh" => Self::Ssh,
            "kv" => Self::KvV1,
            "kv2" => Self::KvV2,
            "totp" => Self::Totp,
            "transit" => Self::Transit,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Resolve the type of a mounted engine from its mount type and `options.version`
    pub fn from_mount(mount_type: &str, version: Option<&str>) -> Self {
        if mount_type == "kv" {
            return match version {
                Some("2") => Self::KvV2,
                _ => Self::KvV1,
            };
        }
        Self::parse(mount_type)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ad => "ad",
            Self::Aws => "aws",
            Self::Database => "database",
            Self::Pki => "pki",
            Self::Ssh => "ssh",
            Self::KvV1 => "kv",
            Self::KvV2 => "kv2",
            Self::Totp => "totp",
            Self::Transit => "transit",
            Self::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    /// Engines whose state is fully reachable through the logical API
    pub fn allows_raw(&self) -> bool {
        !matches!(self, Self::KvV2 | Self::Transit)
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EngineType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EngineType> for String {
    fn from(value: EngineType) -> Self {
        value.as_str().to_string()
    }
}

/// A mounted secrets engine, immutable for the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMount {
    /// Mount path without the trailing slash
    pub path: String,
    pub engine_type: EngineType,
    pub uuid: String,
}

impl EngineMount {
    pub fn new(path: impl Into<String>, engine_type: EngineType, uuid: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: path.trim_matches('/').to_string(),
            engine_type,
            uuid: uuid.into(),
        }
    }

    /// Root of this engine in the raw storage keyspace
    pub fn raw_prefix(&self) -> String {
        key_path::join(&["logical", &self.uuid])
    }

    /// Directory name used under the backup destination: `<mountPath>.<engineType>`
    pub fn backup_dir_name(&self) -> String {
        format!("{}.{}", self.path, self.engine_type)
    }

    /// Check that a restore source directory was produced for this engine's type.
    pub fn validate_restore_source(&self, source: &Utf8Path) -> Result<()> {
        let name = source.file_name().ok_or_else(|| {
            Error::validation(format!("Restore path {} has no directory name", source))
        })?;

        match split_engine_dir_name(name) {
            Some((_, found)) if found == self.engine_type => Ok(()),
            Some((_, found)) => Err(Error::validation(format!(
                "Restore path {} holds a '{}' backup but mount '{}' is '{}'",
                source, found, self.path, self.engine_type
            ))),
            None => Err(Error::validation(format!(
                "Restore path {} does not end in .<engine type>",
                source
            ))),
        }
    }
}

/// Split `<name>.<engineType>[-r]` into its name and engine type.
///
/// Returns `None` when there is no suffix or the suffix is not a known type.
pub fn split_engine_dir_name(name: &str) -> Option<(&str, EngineType)> {
    let (stem, suffix) = name.rsplit_once('.')?;
    let suffix = suffix.strip_suffix(RAW_DIR_SUFFIX).unwrap_or(suffix);
    let engine_type = EngineType::parse(suffix);
    if stem.is_empty() || !engine_type.is_supported() {
        return None;
    }
    Some((stem, engine_type))
}
