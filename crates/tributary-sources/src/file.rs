//! File-backed configuration resource.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tributary_core::{Decoder, DecoderRegistry, Resource, Result, StopHandle, TributaryError, Value};

/// A configuration file. The decoder is resolved from the registry by file
/// extension at construction time.
pub struct FileResource {
    inner: Arc<FileInner>,
}

impl std::fmt::Debug for FileResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResource")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

struct FileInner {
    path: PathBuf,
    decoder: Arc<dyn Decoder>,
    /// Last raw content observed, for change suppression.
    last_seen: Mutex<Option<Vec<u8>>>,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>, registry: &DecoderRegistry) -> Result<Self> {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                TributaryError::UnknownFormat(format!("{}: no file extension", path.display()))
            })?
            .to_owned();
        let decoder = registry
            .resolve(&ext)
            .ok_or_else(|| TributaryError::UnknownFormat(ext))?;
        Ok(Self {
            inner: Arc::new(FileInner {
                path,
                decoder,
                last_seen: Mutex::new(None),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

impl FileInner {
    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            TributaryError::SourceUnavailable(format!("{}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl Resource for FileResource {
    async fn load(&self, cancel: &CancellationToken) -> Result<Value> {
        if cancel.is_cancelled() {
            return Err(TributaryError::Cancelled);
        }
        let data = self.inner.read().await?;
        let parsed = self.inner.decoder.parse(&data)?;
        *self.inner.last_seen.lock() = Some(data);
        Ok(parsed)
    }

    async fn watch(
        &self,
        cancel: CancellationToken,
        changes: mpsc::Sender<Value>,
        errors: mpsc::Sender<TributaryError>,
    ) -> Result<StopHandle> {
        if cancel.is_cancelled() {
            return Err(TributaryError::Cancelled);
        }

        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<NotifyEvent>| {
                let _ = raw_tx.send(res);
            })
            .map_err(|e| TributaryError::SubscriptionFailed(e.to_string()))?;

        // Watch the parent directory: editors often write a temp file and
        // rename it over the target.
        let dir = self.inner.path.parent().unwrap_or(Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| TributaryError::SubscriptionFailed(e.to_string()))?;

        info!(path = ?self.inner.path, "file watch started");

        let stop_token = cancel.child_token();
        let token = stop_token.clone();
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            // Keep the watcher alive for the lifetime of the task.
            let _watcher = watcher;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        if cancel.is_cancelled() {
                            let _ = errors.send(TributaryError::Cancelled).await;
                        }
                        break;
                    }
                    received = raw_rx.recv() => match received {
                        None => {
                            // The notify backend dropped its channel; watching
                            // cannot continue.
                            let _ = errors
                                .send(TributaryError::SourceUnavailable(format!(
                                    "{}: file watcher terminated",
                                    inner.path.display()
                                )))
                                .await;
                            break;
                        }
                        Some(Err(e)) => {
                            let _ = errors
                                .send(TributaryError::SourceUnavailable(e.to_string()))
                                .await;
                        }
                        Some(Ok(event)) => {
                            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                                continue;
                            }
                            let ours = event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == inner.path.file_name());
                            if !ours {
                                continue;
                            }
                            if !inner.handle_change(&changes, &errors).await {
                                break;
                            }
                        }
                    }
                }
            }
            debug!(path = ?inner.path, "file watch stopped");
        });

        Ok(StopHandle::from_task(stop_token, task))
    }
}

impl FileInner {
    /// Re-read the file after a filesystem event; decode and notify unless
    /// the content is byte-for-byte unchanged. Returns `false` when the
    /// change channel is gone and the loop should exit.
    async fn handle_change(
        &self,
        changes: &mpsc::Sender<Value>,
        errors: &mpsc::Sender<TributaryError>,
    ) -> bool {
        let data = match self.read().await {
            Ok(data) => data,
            Err(e) => {
                let _ = errors.send(e).await;
                return true;
            }
        };
        if self.last_seen.lock().as_deref() == Some(data.as_slice()) {
            debug!(path = ?self.path, "content unchanged, suppressing notification");
            return true;
        }
        match self.decoder.parse(&data) {
            Ok(value) => {
                if changes.send(value).await.is_err() {
                    return false;
                }
                *self.last_seen.lock() = Some(data);
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "file changed but failed to decode");
                let _ = errors.send(e).await;
            }
        }
        true
    }
}
