//! Environment-variable configuration resource.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tributary_core::{Decoder, DecoderRegistry, Resource, Result, StopHandle, TributaryError, Value};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Environment variables sharing a prefix, presented as one `KEY=VALUE`
/// document. The process environment has no change notification primitive,
/// so watching polls on a fixed interval.
pub struct EnvResource {
    inner: Arc<EnvInner>,
}

struct EnvInner {
    prefix: String,
    interval: Duration,
    decoder: Arc<dyn Decoder>,
    last_seen: Mutex<Option<Vec<u8>>>,
}

impl EnvResource {
    /// `interval` is the poll cadence for `watch`; zero selects the 5-second
    /// default, anything below one second is clamped up.
    pub fn new(
        prefix: impl Into<String>,
        interval: Duration,
        registry: &DecoderRegistry,
    ) -> Result<Self> {
        let decoder = registry
            .resolve("env")
            .ok_or_else(|| TributaryError::UnknownFormat("env".to_owned()))?;
        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval.max(MIN_POLL_INTERVAL)
        };
        Ok(Self {
            inner: Arc::new(EnvInner {
                prefix: prefix.into(),
                interval,
                decoder,
                last_seen: Mutex::new(None),
            }),
        })
    }
}

impl EnvInner {
    /// Collect all matching variables, sorted for a stable representation.
    fn snapshot(&self) -> Result<Vec<u8>> {
        let mut lines: Vec<String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(&self.prefix))
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if lines.is_empty() {
            return Err(TributaryError::SourceUnavailable(format!(
                "no environment variables with prefix {:?}",
                self.prefix
            )));
        }
        lines.sort();
        Ok(lines.join("\n").into_bytes())
    }
}

#[async_trait]
impl Resource for EnvResource {
    async fn load(&self, cancel: &CancellationToken) -> Result<Value> {
        if cancel.is_cancelled() {
            return Err(TributaryError::Cancelled);
        }
        let data = self.inner.snapshot()?;
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

        info!(prefix = %self.inner.prefix, interval = ?self.inner.interval, "environment watch started");

        let stop_token = cancel.child_token();
        let token = stop_token.clone();
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            // Consume the immediate first tick so polling starts one
            // interval from now.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        if cancel.is_cancelled() {
                            let _ = errors.send(TributaryError::Cancelled).await;
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        let data = match inner.snapshot() {
                            Ok(data) => data,
                            Err(e) => {
                                let _ = errors.send(e).await;
                                continue;
                            }
                        };
                        if inner.last_seen.lock().as_deref() == Some(data.as_slice()) {
                            continue;
                        }
                        match inner.decoder.parse(&data) {
                            Ok(value) => {
                                if changes.send(value).await.is_err() {
                                    break;
                                }
                                *inner.last_seen.lock() = Some(data);
                            }
                            Err(e) => {
                                let _ = errors.send(e).await;
                            }
                        }
                    }
                }
            }
            debug!(prefix = %inner.prefix, "environment watch stopped");
        });

        Ok(StopHandle::from_task(stop_token, task))
    }
}
