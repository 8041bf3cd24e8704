//! Payload containers exchanged with the remote store

use serde::{Deserialize, Serialize};

/// Generic ordered key/value payload used at every API boundary
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Default number of entries packed into one chunk file
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Encoding of a raw storage value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawEncoding {
    /// Value is sent as-is
    Plain,
    /// Value is base64 and the server decodes it before storing
    Base64,
}

impl RawEncoding {
    /// Value for the `encoding` request parameter, if any
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            RawEncoding::Plain => None,
            RawEncoding::Base64 => Some("base64"),
        }
    }
}

/// A value read from or written to the raw storage keyspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub value: String,
    pub encoding: RawEncoding,
}

impl RawEntry {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            encoding: RawEncoding::Plain,
        }
    }

    pub fn base64(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            encoding: RawEncoding::Base64,
        }
    }
}

/// Per-run switches shared by every engine pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Use the raw storage keyspace where an engine supports it
    pub raw: bool,
    /// Base64-wrap raw values in backup files
    pub base64_encode: bool,
    /// Entries per chunk file
    pub chunk_size: usize,
    /// Accepted but not implemented
    pub compress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            raw: false,
            base64_encode: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            compress: false,
        }
    }
}
