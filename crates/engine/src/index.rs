//! Hot-swappable handle to the current lexical snapshot.
//!
//! Readers clone an `Arc` to the installed snapshot and keep serving from it
//! while a rebuild runs; the new snapshot is built fully in memory and swapped
//! in with a single write. Rebuilds are serialized. Disk and build work runs
//! on the blocking pool under the handle's I/O timeout.

use crate::backend::DocumentSource;
use crate::metrics;
use hybridsearch_core::config;
use hybridsearch_core::storage::{load_snapshot, save_snapshot, LexicalSnapshot};
use hybridsearch_core::{Result, RetrievalError};
use parking_lot::RwLock;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How [`LexicalIndexHandle::load_or_bootstrap`] obtained its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Loaded,
    Rebuilt,
}

pub struct LexicalIndexHandle {
    current: RwLock<Option<Arc<LexicalSnapshot>>>,
    rebuild_lock: tokio::sync::Mutex<()>,
    io_timeout: Duration,
}

impl Default for LexicalIndexHandle {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
            rebuild_lock: tokio::sync::Mutex::new(()),
            io_timeout: Duration::from_millis(config::DEFAULT_SNAPSHOT_IO_TIMEOUT_MS),
        }
    }
}

/// Runs `work` on the blocking pool, bounded by `limit`. On expiry the
/// caller gets `Timeout`; the blocking thread is left to finish on its own.
async fn run_blocking<T, F>(stage: &'static str, limit: Duration, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(RetrievalError::Snapshot(io::Error::other(e.to_string()))),
        Err(_) => Err(RetrievalError::Timeout { stage, after: limit }),
    }
}

impl LexicalIndexHandle {
    /// Empty handle. Searches fail with `IndexNotLoaded` until a snapshot is installed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LexicalSnapshot) -> Self {
        let handle = Self::new();
        handle.install(Arc::new(snapshot));
        handle
    }

    /// Bounds every snapshot load, persist and build.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Result<Arc<LexicalSnapshot>> {
        self.current
            .read()
            .as_ref()
            .cloned()
            .ok_or(RetrievalError::IndexNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Atomically replaces the served snapshot.
    pub fn install(&self, snapshot: Arc<LexicalSnapshot>) {
        let count = snapshot.len();
        *self.current.write() = Some(snapshot);
        metrics::update_lexical_documents(count);
        tracing::info!("Installed lexical snapshot ({} documents)", count);
    }

    /// Loads a snapshot from disk and installs it. Nothing is installed on failure.
    pub async fn load(&self, path: &Path) -> Result<usize> {
        let path = path.to_path_buf();
        let snapshot = run_blocking("snapshot load", self.io_timeout, move || {
            Ok(load_snapshot(&path)?)
        })
        .await?;
        let count = snapshot.len();
        self.install(Arc::new(snapshot));
        Ok(count)
    }

    /// Writes the current snapshot to disk (atomic replace).
    pub async fn persist(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot()?;
        self.write(snapshot, path).await
    }

    async fn write(&self, snapshot: Arc<LexicalSnapshot>, path: &Path) -> Result<()> {
        let path = path.to_path_buf();
        run_blocking("snapshot persist", self.io_timeout, move || {
            Ok(save_snapshot(&snapshot, &path)?)
        })
        .await
    }

    /// Builds a new snapshot from `source` and swaps it in. The previous
    /// snapshot stays servable until the swap.
    pub async fn rebuild(&self, source: &dyn DocumentSource) -> Result<Arc<LexicalSnapshot>> {
        let _guard = self.rebuild_lock.lock().await;
        let documents = source.scroll_all().await?;
        tracing::info!("Rebuilding lexical snapshot from {} documents", documents.len());
        let snapshot = run_blocking("snapshot build", self.io_timeout, move || {
            Ok(LexicalSnapshot::build(documents))
        })
        .await?;
        let snapshot = Arc::new(snapshot);
        self.install(snapshot.clone());
        Ok(snapshot)
    }

    /// Rebuilds, installs, then persists to `path`.
    pub async fn rebuild_and_persist(&self, source: &dyn DocumentSource, path: &Path) -> Result<usize> {
        let snapshot = self.rebuild(source).await?;
        let count = snapshot.len();
        self.write(snapshot, path).await?;
        Ok(count)
    }

    /// Loads the snapshot at `path`; on any load failure rebuilds from
    /// `source` and persists the result.
    pub async fn load_or_bootstrap(
        &self,
        path: &Path,
        source: &dyn DocumentSource,
    ) -> Result<BootstrapOutcome> {
        match self.load(path).await {
            Ok(count) => {
                tracing::info!("Lexical snapshot loaded from {:?} ({} documents)", path, count);
                Ok(BootstrapOutcome::Loaded)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load lexical snapshot {:?}: {}. Bootstrapping from document source",
                    path,
                    e
                );
                self.rebuild_and_persist(source, path).await?;
                Ok(BootstrapOutcome::Rebuilt)
            }
        }
    }
}
