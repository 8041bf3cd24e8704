//! Per-mount handle threaded through every engine operation

use camino::Utf8PathBuf;
use std::sync::Arc;
use tracing::{info_span, Span};
use vaultkeep_core::types::{EngineMount, RunOptions};
use vaultkeep_store::{LocalStore, SecretStore};

/// Everything one backup or restore pass of a mount needs.
///
/// Built once per mount by the driver. The span carries the mount path and
/// engine type so every log line of the pass is attributable.
pub struct EngineContext {
    pub store: Arc<dyn SecretStore>,
    pub local: LocalStore,
    pub mount: EngineMount,
    pub options: RunOptions,
    span: Span,
}

impl EngineContext {
    pub fn new(
        store: Arc<dyn SecretStore>,
        mount: EngineMount,
        local_root: impl Into<Utf8PathBuf>,
        mut options: RunOptions,
    ) -> Self {
        if !mount.engine_type.allows_raw() {
            options.raw = false;
        }
        let span = info_span!(
            "engine",
            engine_path = %mount.path,
            engine_type = %mount.engine_type
        );
        Self {
            store,
            local: LocalStore::new(local_root),
            mount,
            options,
            span,
        }
    }

    pub fn store(&self) -> &dyn SecretStore {
        self.store.as_ref()
    }

    /// Whether raw keyspace access is in effect for this mount
    pub fn raw_enabled(&self) -> bool {
        self.options.raw
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
