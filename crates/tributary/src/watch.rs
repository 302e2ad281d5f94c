//! Continuous aggregation: one watch session per resource, fanned into a
//! single signal stream, debounced onto a fixed reload tick.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tributary_core::{Resource, Result, StopHandle, TributaryError, Value};

use crate::load::load;

/// Cadence of the debounce tick. All change signals arriving within one tick
/// collapse into a single full reload, bounding the reload rate to one per
/// tick regardless of burst size.
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Watch every resource and republish a freshly loaded `T` whenever any of
/// them changes.
///
/// Successive typed snapshots are sent on `snapshots`; reload errors and
/// resource watch errors are sent on `errors`. Each reload is a full
/// re-fetch-and-remerge across all resources, never an incremental update of
/// the one that changed. A failed reload leaves the session dirty and is
/// retried on every subsequent tick until it succeeds or the session stops —
/// fixed interval, no backoff, no retry limit.
///
/// Returns a [`StopHandle`] for the whole session. If any subscription fails
/// during startup, every already-started watch is stopped and the error is
/// returned; no partial session survives. Cancelling `cancel` terminates all
/// subscriptions and surfaces `Cancelled` on the error channel; an explicit
/// stop tears the session down silently. Stop is idempotent and safe to call
/// concurrently with an in-flight cancellation.
pub async fn watch<T>(
    cancel: CancellationToken,
    snapshots: mpsc::Sender<T>,
    errors: mpsc::Sender<TributaryError>,
    resources: Vec<Arc<dyn Resource>>,
) -> Result<StopHandle>
where
    T: DeserializeOwned + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(TributaryError::Cancelled);
    }

    // Stopping this token tears down the relays and the coordinator, but not
    // the resources themselves: those are stopped through their own handles,
    // so an explicit stop is not mistaken for a governing cancellation.
    let session = cancel.child_token();
    let handle = StopHandle::new(session.clone());

    let (signal_tx, signal_rx) = mpsc::channel::<()>(resources.len().max(1));

    for resource in &resources {
        let (change_tx, change_rx) = mpsc::channel::<Value>(1);
        match resource.watch(cancel.clone(), change_tx, errors.clone()).await {
            Ok(stop) => handle.push_child(stop),
            Err(err) => {
                warn!(error = %err, "subscription failed, stopping partial session");
                if let Err(stop_err) = handle.stop().await {
                    return Err(TributaryError::SubscriptionFailed(format!(
                        "{err}; {stop_err}"
                    )));
                }
                return Err(err);
            }
        }
        handle.push_task(spawn_relay(session.clone(), change_rx, signal_tx.clone()));
    }
    drop(signal_tx);

    handle.push_task(spawn_coordinator(
        cancel,
        session,
        signal_rx,
        snapshots,
        errors,
        resources,
    ));

    Ok(handle)
}

/// Forward every change event from one resource into the shared signal
/// stream. The decoded document itself is discarded; the coordinator only
/// needs to know that something changed, and reloads in full.
fn spawn_relay(
    session: CancellationToken,
    mut changes: mpsc::Receiver<Value>,
    signals: mpsc::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = session.cancelled() => break,
                received = changes.recv() => match received {
                    Some(_) => {
                        if signals.send(()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    })
}

/// Own the dirty flag and the reload tick.
///
/// A signal sets the flag; a tick with the flag set triggers one full
/// aggregated load. Success publishes the snapshot and clears the flag;
/// failure reports the error and leaves the flag set so the next tick
/// retries without needing a new signal.
fn spawn_coordinator<T>(
    cancel: CancellationToken,
    session: CancellationToken,
    mut signals: mpsc::Receiver<()>,
    snapshots: mpsc::Sender<T>,
    errors: mpsc::Sender<TributaryError>,
    resources: Vec<Arc<dyn Resource>>,
) -> tokio::task::JoinHandle<()>
where
    T: DeserializeOwned + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RELOAD_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Consume the immediate first tick so the earliest possible reload is
        // one full interval after the session starts.
        ticker.tick().await;
        let mut dirty = false;
        loop {
            tokio::select! {
                _ = session.cancelled() => {
                    if cancel.is_cancelled() {
                        let _ = errors.send(TributaryError::Cancelled).await;
                    }
                    break;
                }
                received = signals.recv() => match received {
                    Some(()) => dirty = true,
                    // Every relay has exited.
                    None => break,
                },
                _ = ticker.tick() => {
                    if !dirty {
                        continue;
                    }
                    match load::<T>(&session, &resources).await {
                        Ok(snapshot) => {
                            if snapshots.send(snapshot).await.is_err() {
                                break;
                            }
                            dirty = false;
                            info!("configuration reloaded");
                        }
                        // Stop or cancellation raced the reload; the exit
                        // path above reports it.
                        Err(TributaryError::Cancelled) => continue,
                        Err(err) => {
                            warn!(error = %err, "reload failed, retrying on next tick");
                            let _ = errors.send(err).await;
                        }
                    }
                }
            }
        }
    })
}
