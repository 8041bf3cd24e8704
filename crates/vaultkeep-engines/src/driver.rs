//! Runs backup and restore passes over the selected mounts
//!
//! Mounts are processed one at a time in mount-path order. Concurrent runs
//! against the same backup directory or mount are not supported: they can
//! interleave chunk numbering and version replay.

use crate::context::EngineContext;
use crate::engines::new_engine;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use vaultkeep_core::types::{split_engine_dir_name, EngineMount, RunOptions};
use vaultkeep_core::{Error, Result};
use vaultkeep_store::SecretStore;
use walkdir::WalkDir;

/// Outcome of one mount's pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountReport {
    pub mount: EngineMount,
    pub dir: Utf8PathBuf,
    pub keys: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub mounts: Vec<MountReport>,
}

impl RunReport {
    pub fn total_keys(&self) -> usize {
        self.mounts.iter().map(|m| m.keys).sum()
    }
}

/// An engine directory found under a restore source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDir {
    /// Mount path the directory was produced from
    pub mount_path: String,
    pub dir: Utf8PathBuf,
}

pub struct Driver {
    store: Arc<dyn SecretStore>,
    options: RunOptions,
}

impl Driver {
    pub fn new(store: Arc<dyn SecretStore>, options: RunOptions) -> Self {
        debug!("Driver using {} store with {:?}", store.name(), options);
        Self { store, options }
    }

    /// Mounts a pass will cover.
    ///
    /// With `path`, exactly that mount, which must exist and be supported.
    /// Without, every supported mount in path order.
    pub async fn select_mounts(&self, path: Option<&str>) -> Result<Vec<EngineMount>> {
        let mut mounts = self.store.list_mounted_engines().await?;
        mounts.sort_by(|a, b| a.path.cmp(&b.path));

        match path {
            Some(path) => {
                let mount = find_mount(&mounts, path)?;
                if !mount.engine_type.is_supported() {
                    return Err(Error::validation(format!(
                        "Mount '{}' has unsupported engine type '{}'",
                        mount.path, mount.engine_type
                    )));
                }
                Ok(vec![mount])
            }
            None => Ok(mounts
                .into_iter()
                .filter(|m| {
                    let supported = m.engine_type.is_supported();
                    if !supported {
                        warn!(
                            "Skipping mount {} with unsupported engine type {}",
                            m.path, m.engine_type
                        );
                    }
                    supported
                })
                .collect()),
        }
    }

    /// Back up one mount, or every supported mount, under `dest`
    pub async fn backup(&self, dest: &Utf8Path, path: Option<&str>) -> Result<RunReport> {
        self.warn_compress();
        let mut report = RunReport::default();
        for mount in self.select_mounts(path).await? {
            let dir = dest.join(mount.backup_dir_name());
            report.mounts.push(self.backup_mount(mount, dir).await?);
        }
        Ok(report)
    }

    pub async fn backup_mount(&self, mount: EngineMount, dir: Utf8PathBuf) -> Result<MountReport> {
        let engine = new_engine(&mount.engine_type)?;
        let ctx = EngineContext::new(self.store.clone(), mount, dir, self.options.clone());
        let span = ctx.span().clone();

        let keys = async {
            info!("Start backup to {}", ctx.local.root());
            ctx.local.ensure_root().await?;
            let keys = engine.backup(&ctx).await?;
            info!("Backed up {} keys", keys);
            Ok::<_, Error>(keys)
        }
        .instrument(span)
        .await?;

        Ok(MountReport {
            dir: ctx.local.root().to_path_buf(),
            mount: ctx.mount,
            keys,
        })
    }

    /// Restore from `source`.
    ///
    /// With `path`, `source` is the engine directory for that mount. Without,
    /// `source` is scanned for engine directories. Every directory is
    /// validated against its mount before anything is written.
    pub async fn restore(&self, source: &Utf8Path, path: Option<&str>) -> Result<RunReport> {
        self.warn_compress();
        let plan = match path {
            Some(path) => {
                let mount = self
                    .select_mounts(Some(path))
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::validation(format!("No mount at {}", path)))?;
                mount.validate_restore_source(source)?;
                vec![(mount, source.to_path_buf())]
            }
            None => {
                let mounts = self.store.list_mounted_engines().await?;
                let mut plan = Vec::new();
                for found in discover_engine_dirs(source)? {
                    let mount = find_mount(&mounts, &found.mount_path)?;
                    mount.validate_restore_source(&found.dir)?;
                    plan.push((mount, found.dir));
                }
                plan
            }
        };

        let mut report = RunReport::default();
        for (mount, dir) in plan {
            report.mounts.push(self.restore_mount(mount, dir).await?);
        }
        Ok(report)
    }

    pub async fn restore_mount(&self, mount: EngineMount, dir: Utf8PathBuf) -> Result<MountReport> {
        let engine = new_engine(&mount.engine_type)?;
        let ctx = EngineContext::new(self.store.clone(), mount, dir, self.options.clone());
        let span = ctx.span().clone();

        let keys = async {
            info!("Start restore from {}", ctx.local.root());
            let keys = engine.restore(&ctx).await?;
            info!("Restored {} keys", keys);
            Ok::<_, Error>(keys)
        }
        .instrument(span)
        .await?;

        Ok(MountReport {
            dir: ctx.local.root().to_path_buf(),
            mount: ctx.mount,
            keys,
        })
    }

    fn warn_compress(&self) {
        if self.options.compress {
            warn!("Compression is not implemented; files are written uncompressed");
        }
    }
}

fn find_mount(mounts: &[EngineMount], path: &str) -> Result<EngineMount> {
    let path = path.trim_matches('/');
    mounts
        .iter()
        .find(|m| m.path == path)
        .cloned()
        .ok_or_else(|| Error::validation(format!("No secrets engine mounted at '{}'", path)))
}

/// Engine directories (`<mountPath>.<engineType>`) under `source`, by mount path.
///
/// `source` may itself be an engine directory. Engine directories are not
/// searched further.
pub fn discover_engine_dirs(source: &Utf8Path) -> Result<Vec<EngineDir>> {
    if !source.is_dir() {
        return Err(Error::validation(format!(
            "Restore source {} is not a directory",
            source
        )));
    }

    if let Some((stem, _)) = source.file_name().and_then(split_engine_dir_name) {
        return Ok(vec![EngineDir {
            mount_path: stem.to_string(),
            dir: source.to_path_buf(),
        }]);
    }

    let mut found = Vec::new();
    let mut walker = WalkDir::new(source).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(dir) = Utf8Path::from_path(entry.path()) else {
            continue;
        };
        let Some((stem, _)) = dir.file_name().and_then(split_engine_dir_name) else {
            continue;
        };

        let parent = dir
            .parent()
            .and_then(|p| p.strip_prefix(source).ok())
            .map(|p| p.as_str().replace('\\', "/"))
            .unwrap_or_default();
        let mount_path = if parent.is_empty() {
            stem.to_string()
        } else {
            format!("{}/{}", parent, stem)
        };

        found.push(EngineDir {
            mount_path,
            dir: dir.to_path_buf(),
        });
        walker.skip_current_dir();
    }

    found.sort_by(|a, b| a.mount_path.cmp(&b.mount_path));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultkeep_core::types::EngineType;
    use vaultkeep_store::MemoryStore;

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with_mount(EngineMount::new("ssh", EngineType::Ssh, "u2"))
                .with_mount(EngineMount::new("secret", EngineType::KvV2, "u1"))
                .with_mount(EngineMount::new("nomad", EngineType::parse("nomad"), "u3")),
        )
    }

    #[tokio::test]
    async fn test_select_all_skips_unsupported_and_sorts() {
        let driver = Driver::new(store(), RunOptions::default());
        let mounts = driver.select_mounts(None).await.unwrap();
        let paths: Vec<_> = mounts.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["secret", "ssh"]);
    }

    #[tokio::test]
    async fn test_select_named_mount() {
        let driver = Driver::new(store(), RunOptions::default());
        let mounts = driver.select_mounts(Some("ssh/")).await.unwrap();
        assert_eq!(mounts[0].engine_type, EngineType::Ssh);

        let err = driver.select_mounts(Some("missing")).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        let err = driver.select_mounts(Some("nomad")).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_restore_type_mismatch_aborts_before_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let source = utf8(&dir).join("ssh.kv2");
        std::fs::create_dir_all(source.join("roles")).unwrap();
        std::fs::write(source.join("roles/web"), "e30=").unwrap();

        let memory = store();
        let driver = Driver::new(memory.clone(), RunOptions::default());
        let err = driver.restore(&source, Some("ssh")).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(memory.operations().is_empty());
    }

    #[test]
    fn test_discover_engine_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        std::fs::create_dir_all(root.join("team/ssh.ssh/roles")).unwrap();
        std::fs::create_dir_all(root.join("secret.kv2")).unwrap();
        std::fs::create_dir_all(root.join("pki.pki-r/certs.kv")).unwrap();
        std::fs::create_dir_all(root.join("notes")).unwrap();

        let found = discover_engine_dirs(&root).unwrap();
        let paths: Vec<_> = found.iter().map(|d| d.mount_path.as_str()).collect();
        assert_eq!(paths, vec!["pki", "secret", "team/ssh"]);
        assert_eq!(found[2].dir, root.join("team/ssh.ssh"));
    }

    #[test]
    fn test_discover_source_that_is_an_engine_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = utf8(&dir).join("secret.kv2");
        std::fs::create_dir_all(&source).unwrap();
        let found = discover_engine_dirs(&source).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mount_path, "secret");
    }

    #[tokio::test]
    async fn test_restore_all_rejects_unknown_mount() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        std::fs::create_dir_all(root.join("gone.kv")).unwrap();

        let driver = Driver::new(store(), RunOptions::default());
        let err = driver.restore(&root, None).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
