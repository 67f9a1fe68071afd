//! Polling fallback for liveness observation
//!
//! Runs only when push subscriptions could not be established. A single
//! task probes the platform for the whole monitored set on a fixed
//! interval and feeds the result into [`Reconciler::ingest_bulk`]. Ticks
//! never overlap: the loop awaits the probe before asking for the next
//! tick, and missed ticks are skipped rather than queued, so a slow
//! upstream never stacks concurrent probes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::reconciler::Reconciler;
use crate::traits::StreamPlatform;

/// Handle to a running poller task
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop the poller and wait for the task to finish
    ///
    /// An in-flight probe is allowed to complete; no new tick starts after
    /// the shutdown signal.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the polling loop
///
/// Probe failures are logged and leave the previous liveness view in
/// place; the timer keeps running and the next tick retries.
pub fn spawn_poller(
    platform: Arc<dyn StreamPlatform>,
    reconciler: Arc<Reconciler>,
    interval: Duration,
) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(?interval, "starting liveness polling");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately; the startup
        // probe already covered that, so consume it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match platform.live_channels(reconciler.channels()).await {
                        Ok(live) => {
                            if let Err(error) = reconciler.ingest_bulk(&live).await {
                                warn!(%error, "failed to apply redirect after poll");
                            }
                        }
                        Err(error) => {
                            warn!(%error, "liveness probe failed, keeping previous view");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("stopping liveness polling");
                    break;
                }
            }
        }
    });

    PollerHandle { shutdown_tx, task }
}
