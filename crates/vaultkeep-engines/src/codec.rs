//! Base64 and JSON encoding of backup files

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vaultkeep_core::{Error, Result};

/// base64(JSON(value))
pub fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(STANDARD.encode(bytes))
}

/// base64 over raw bytes
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64; `origin` names the file or key for error messages
pub fn decode_bytes(origin: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::decode(origin, e))
}

/// Inverse of [`encode_json`]
pub fn decode_json<T: DeserializeOwned>(origin: &str, encoded: &str) -> Result<T> {
    let bytes = decode_bytes(origin, encoded)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::decode(origin, e))
}
