//! The configuration source contract.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, TributaryError};
use crate::value::Value;

/// A single configuration source, exposing one-shot fetch and continuous
/// observation.
///
/// Implementations must keep a private copy of the last raw bytes they
/// observed and skip the change notification entirely when new content is
/// byte-for-byte identical, so a source that reports a write with unchanged
/// content (e.g. a file touched but not modified) never triggers a downstream
/// reload.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Fetch the current raw content, decode it, and return the map-shaped
    /// document. Safe to call repeatedly and concurrently with `watch`.
    ///
    /// Fails with `SourceUnavailable` (backend connectivity), `Decode`
    /// (malformed content), or `Cancelled` (token fired before completion).
    async fn load(&self, cancel: &CancellationToken) -> Result<Value>;

    /// Begin continuous observation. Each change to the source's content
    /// sends a freshly decoded document on `changes`; observation failures
    /// that do not terminate watching are sent on `errors`.
    ///
    /// Returns as soon as the subscription is established, or fails fast with
    /// `Cancelled` / `SubscriptionFailed` if the token is already cancelled
    /// or subscription setup fails.
    async fn watch(
        &self,
        cancel: CancellationToken,
        changes: mpsc::Sender<Value>,
        errors: mpsc::Sender<TributaryError>,
    ) -> Result<StopHandle>;
}

/// Idempotent stop for a watch task (or a whole watch session).
///
/// Cancels an internal token and joins the associated tasks exactly once;
/// further calls, including concurrent ones from other tasks, are no-ops.
#[derive(Clone)]
pub struct StopHandle {
    inner: Arc<StopInner>,
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle").finish_non_exhaustive()
    }
}

struct StopInner {
    token: CancellationToken,
    children: Mutex<Vec<StopHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl StopHandle {
    /// A handle that only cancels `token` when stopped.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(StopInner {
                token,
                children: Mutex::new(Vec::new()),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A handle that cancels `token` and joins `task` when stopped.
    pub fn from_task(token: CancellationToken, task: JoinHandle<()>) -> Self {
        let handle = Self::new(token);
        handle.push_task(task);
        handle
    }

    /// Attach a subordinate handle, stopped before this handle's own tasks
    /// are joined.
    pub fn push_child(&self, child: StopHandle) {
        self.inner.children.lock().push(child);
    }

    /// Attach a task joined during stop.
    pub fn push_task(&self, task: JoinHandle<()>) {
        self.inner.tasks.lock().push(task);
    }

    /// Stop everything owned by this handle.
    ///
    /// Cancels the internal token, stops every child handle (continuing past
    /// individual failures), and joins every attached task. Failures are
    /// combined into a single `Stop` error. Idempotent: subsequent calls find
    /// nothing left to stop and return `Ok`.
    pub async fn stop(&self) -> Result<()> {
        self.inner.token.cancel();
        let children = std::mem::take(&mut *self.inner.children.lock());
        let tasks = std::mem::take(&mut *self.inner.tasks.lock());

        let mut failures = Vec::new();
        for child in children {
            if let Err(err) = Box::pin(child.stop()).await {
                failures.push(err.to_string());
            }
        }
        for task in tasks {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    failures.push(err.to_string());
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TributaryError::Stop(failures.join("; ")))
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.token.is_cancelled()
    }
}
