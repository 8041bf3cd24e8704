//! Local file store rooted at one engine's backup directory

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use vaultkeep_core::types::key_path;
use vaultkeep_core::{Error, Result};
use walkdir::WalkDir;

/// Reads, writes and lists files by key path relative to a root directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: Utf8PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute location of a relative key path
    pub fn path_of(&self, rel: &str) -> Utf8PathBuf {
        let rel = key_path::join(&[rel]);
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path_of(rel).exists()
    }

    /// Create the root directory. Safe to call repeatedly.
    pub async fn ensure_root(&self) -> Result<()> {
        debug!("Create local directory: {}", self.root);
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write a file, creating parent directories as needed
    pub async fn write(&self, rel: &str, content: &[u8]) -> Result<()> {
        let path = self.path_of(rel);
        if let Some(parent) = path.parent() {
            debug!("Create parent directory if needed: {}", parent);
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!("Write data to local file: {}", path);
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    /// Read a file; a missing file is `Error::NotFound`
    pub async fn read(&self, rel: &str) -> Result<Vec<u8>> {
        let path = self.path_of(rel);
        debug!("Read local file: {}", path);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })
    }

    /// Read a file as UTF-8 text
    pub async fn read_to_string(&self, rel: &str) -> Result<String> {
        let bytes = self.read(rel).await?;
        String::from_utf8(bytes).map_err(|e| Error::decode(self.path_of(rel).as_str(), e))
    }

    /// Every file under `start`, as key paths relative to the root.
    ///
    /// Entries are visited in file-name order. An absent `start` directory is
    /// `Error::NotFound` so callers can treat it as "nothing to restore".
    pub fn walk(&self, start: &str) -> Result<Vec<String>> {
        let dir = self.path_of(start);
        debug!("List local path: {}", dir);
        if !dir.exists() {
            return Err(Error::not_found(dir.as_str()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Error::decode(entry.path().display().to_string(), e))?;
            let rel = Utf8Path::from_path(rel).ok_or_else(|| {
                Error::decode(rel.display().to_string(), "path is not valid UTF-8")
            })?;
            files.push(rel.components().map(|c| c.as_str()).collect::<Vec<_>>().join("/"));
        }
        Ok(files)
    }
}
