//! HTTP key/value configuration resource.
//!
//! Covers distributed configuration stores that expose a raw-value HTTP
//! endpoint (e.g. a KV store's `?raw` API). The store's own change primitives
//! vary by vendor, so watching polls the endpoint on a fixed interval and
//! relies on byte comparison to suppress no-op fetches.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tributary_core::{Decoder, DecoderRegistry, Resource, Result, StopHandle, TributaryError, Value};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct HttpResource {
    inner: Arc<HttpInner>,
}

impl std::fmt::Debug for HttpResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResource")
            .field("url", &self.inner.url)
            .finish_non_exhaustive()
    }
}

struct HttpInner {
    url: String,
    client: reqwest::Client,
    interval: Duration,
    decoder: Arc<dyn Decoder>,
    last_seen: Mutex<Option<Vec<u8>>>,
}

impl HttpResource {
    /// `format` names the decoder for the endpoint's payload; `interval` is
    /// the poll cadence for `watch` (zero selects the 5-second default).
    pub fn new(
        url: impl Into<String>,
        format: &str,
        interval: Duration,
        registry: &DecoderRegistry,
    ) -> Result<Self> {
        let decoder = registry
            .resolve(format)
            .ok_or_else(|| TributaryError::UnknownFormat(format.to_owned()))?;
        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        Ok(Self {
            inner: Arc::new(HttpInner {
                url: url.into(),
                client: reqwest::Client::new(),
                interval,
                decoder,
                last_seen: Mutex::new(None),
            }),
        })
    }
}

impl HttpInner {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TributaryError::Cancelled),
            sent = self.client.get(&self.url).send() => sent
                .map_err(|e| TributaryError::SourceUnavailable(format!("{}: {e}", self.url)))?,
        };
        if !response.status().is_success() {
            return Err(TributaryError::SourceUnavailable(format!(
                "{}: HTTP {}",
                self.url,
                response.status()
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| TributaryError::SourceUnavailable(format!("{}: {e}", self.url)))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Resource for HttpResource {
    async fn load(&self, cancel: &CancellationToken) -> Result<Value> {
        let data = self.inner.fetch(cancel).await?;
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

        info!(url = %self.inner.url, interval = ?self.inner.interval, "http watch started");

        let stop_token = cancel.child_token();
        let token = stop_token.clone();
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
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
                        let data = match inner.fetch(&token).await {
                            Ok(data) => data,
                            // Cancellation mid-fetch is reported once, on the
                            // exit path above.
                            Err(TributaryError::Cancelled) => continue,
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
            debug!(url = %inner.url, "http watch stopped");
        });

        Ok(StopHandle::from_task(stop_token, task))
    }
}
