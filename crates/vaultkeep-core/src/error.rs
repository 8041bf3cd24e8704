//! Error types for vaultkeep-core

use thiserror::Error;

/// Result type alias using vaultkeep-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while walking, transferring and replaying secrets.
///
/// `NotFound` and `EmptyValue` are recoverable: walkers turn them into an
/// empty listing and single-key transfers into a no-op. Everything else
/// aborts the current mount's pass and bubbles up to the driver unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote path is absent or a local directory does not exist
    #[error("Path not found: {path}")]
    NotFound { path: String },

    /// Remote store reports that a raw key has no content
    #[error("Value is empty: {path}")]
    EmptyValue { path: String },

    /// Any other remote failure
    #[error("Remote request failed for {path} (status {status}): {message}")]
    Remote {
        path: String,
        status: u16,
        message: String,
    },

    /// Malformed local file, base64 or JSON
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// Restore source does not match the target engine, or bad input
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an empty value error
    pub fn empty_value(path: impl Into<String>) -> Self {
        Self::EmptyValue { path: path.into() }
    }

    /// Create a remote failure
    pub fn remote(path: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            path: path.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a decode failure
    pub fn decode(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for an absent remote path or missing local directory/file
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// True when the remote store reported a key with no content
    pub fn is_empty_value(&self) -> bool {
        matches!(self, Self::EmptyValue { .. })
    }
}
