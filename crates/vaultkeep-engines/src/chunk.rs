//! Chunked batch files for flat and versioned keyspaces
//!
//! A backup pass packs `key -> base64(JSON(value))` pairs into sequential
//! `file<seq>.json` objects of at most `capacity` entries each. Across one
//! pass the files partition the key set: no key lands in two files and the
//! file count is `ceil(keys / capacity)`.

use crate::codec;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use vaultkeep_core::{Error, Result};
use vaultkeep_store::LocalStore;

const CHUNK_PREFIX: &str = "file";
const CHUNK_SUFFIX: &str = ".json";

pub fn chunk_file_name(sequence: usize) -> String {
    format!("{}{}{}", CHUNK_PREFIX, sequence, CHUNK_SUFFIX)
}

/// Sequence number of a chunk file name, `None` for anything else
pub fn chunk_sequence(name: &str) -> Option<usize> {
    name.strip_prefix(CHUNK_PREFIX)?
        .strip_suffix(CHUNK_SUFFIX)?
        .parse()
        .ok()
}

/// Totals reported once a writer is finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    pub files: usize,
    pub keys: usize,
}

/// Accumulates encoded entries and flushes them in fixed-size files
pub struct ChunkWriter<'a> {
    local: &'a LocalStore,
    capacity: usize,
    sequence: usize,
    batch: Map<String, Value>,
    written: usize,
}

impl<'a> ChunkWriter<'a> {
    pub fn new(local: &'a LocalStore, capacity: usize) -> Self {
        Self {
            local,
            capacity: capacity.max(1),
            sequence: 0,
            batch: Map::new(),
            written: 0,
        }
    }

    /// Add one entry, flushing a full batch to the next file
    pub async fn push<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let encoded = codec::encode_json(value)?;
        self.batch.insert(key.to_string(), Value::String(encoded));
        if self.batch.len() >= self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush any partial batch. An empty batch produces no file.
    pub async fn finish(mut self) -> Result<ChunkSummary> {
        if !self.batch.is_empty() {
            self.flush().await?;
        }
        Ok(ChunkSummary {
            files: self.sequence,
            keys: self.written,
        })
    }

    async fn flush(&mut self) -> Result<()> {
        let name = chunk_file_name(self.sequence);
        let batch = std::mem::take(&mut self.batch);
        debug!("Write chunk {} with {} entries", name, batch.len());
        let content = serde_json::to_vec(&batch)?;
        self.local.write(&name, &content).await?;
        self.written += batch.len();
        self.sequence += 1;
        Ok(())
    }
}

/// Chunk files directly under the local root, in sequence order
pub fn list_chunk_files(local: &LocalStore) -> Result<Vec<String>> {
    let mut files: Vec<(usize, String)> = local
        .walk("")?
        .into_iter()
        .filter_map(|name| chunk_sequence(&name).map(|seq| (seq, name)))
        .collect();
    files.sort_by_key(|(seq, _)| *seq);
    Ok(files.into_iter().map(|(_, name)| name).collect())
}

/// Entries of one chunk file, still base64-encoded
pub async fn read_chunk(local: &LocalStore, name: &str) -> Result<Vec<(String, String)>> {
    let content = local.read(name).await?;
    let origin = local.path_of(name);
    let entries: Map<String, Value> =
        serde_json::from_slice(&content).map_err(|e| Error::decode(origin.as_str(), e))?;

    entries
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(encoded) => Ok((key, encoded)),
            other => Err(Error::decode(
                origin.as_str(),
                format!("entry '{}' is {} rather than a string", key, other),
            )),
        })
        .collect()
}

/// Decode every entry of every chunk file, in file then insertion order
pub async fn read_all_entries<T: serde::de::DeserializeOwned>(
    local: &LocalStore,
) -> Result<Vec<(String, T)>> {
    let mut out = Vec::new();
    for name in list_chunk_files(local)? {
        for (key, encoded) in read_chunk(local, &name).await? {
            let value = codec::decode_json(&key, &encoded)?;
            out.push((key, value));
        }
    }
    Ok(out)
}
