//! Stream-status reconciliation engine
//!
//! The Reconciler owns the liveness registry and the redirect mirror, and is
//! the only component that talks to the [`RedirectSink`]. Every liveness
//! observation (a single webhook event, a bulk poll result, the startup
//! probe) funnels through [`Reconciler::ingest`] or
//! [`Reconciler::ingest_bulk`], which run the whole
//! read → decide → apply → mirror sequence under one lock.
//!
//! ## Event Flow
//!
//! 1. Liveness observation arrives (webhook, poll, or startup probe)
//! 2. Registry flag(s) updated for monitored channels only
//! 3. Authoritative target recomputed: first live channel in declaration
//!    order, else the default URL, else the previously applied target
//! 4. Sink invoked only when the target differs from the mirror
//! 5. Mirror advanced only after the sink call succeeds

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::channel::ChannelSet;
use crate::error::Result;
use crate::traits::RedirectSink;

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// An event for a channel outside the monitored set was dropped
    ChannelIgnored {
        channel: String,
    },

    /// The authoritative target already matched the applied one
    RedirectUnchanged {
        target: String,
    },

    /// The sink accepted a new target
    RedirectApplied {
        target: String,
        previous: Option<String>,
    },

    /// The sink rejected a new target; the mirror was not advanced
    RedirectApplyFailed {
        target: String,
        error: String,
    },
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the sink was invoked (the target differed from the mirror)
    pub apply: bool,

    /// The authoritative target after this pass, if any is known
    pub target: Option<String>,
}

impl Decision {
    fn unchanged(target: Option<String>) -> Self {
        Self {
            apply: false,
            target,
        }
    }
}

struct ReconcilerState {
    /// Liveness flags, parallel to the channel set's declaration order
    live: Vec<bool>,

    /// Last target the sink confirmed; None until the first apply or seed
    applied: Option<String>,
}

/// The stream-status reconciliation engine
///
/// ## Concurrency
///
/// Webhook handlers, the poller and the startup probe all call into the
/// same reconciler concurrently. A single async mutex around registry,
/// decision, sink call and mirror update makes each pass one critical
/// section, so two concurrent events can never both decide "apply" against
/// stale targets. Decisions take effect in lock-admission order.
pub struct Reconciler {
    /// Monitored channels in declaration order
    channels: ChannelSet,

    /// Fallback target when no channel is live
    default_url: Option<String>,

    /// The redirect record this engine drives
    sink: Box<dyn RedirectSink>,

    /// Registry + mirror, guarded as one unit
    state: Mutex<ReconcilerState>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcilerEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// Every configured channel starts offline; the mirror starts empty
    /// until [`seed_applied_target`](Self::seed_applied_target) or the
    /// first successful apply fills it.
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// reconciler events for monitoring and tests.
    pub fn new(
        channels: ChannelSet,
        default_url: Option<String>,
        sink: Box<dyn RedirectSink>,
        event_channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<ReconcilerEvent>) {
        let (tx, rx) = mpsc::channel(event_channel_capacity);

        let state = ReconcilerState {
            live: vec![false; channels.len()],
            applied: None,
        };

        let reconciler = Self {
            channels,
            default_url,
            sink,
            state: Mutex::new(state),
            event_tx: tx,
        };

        (reconciler, rx)
    }

    /// The monitored channel set (declaration order)
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Seed the mirror from the sink's current record content
    ///
    /// Called once at startup. A failure is not fatal: the mirror stays
    /// empty and the first decision applies unconditionally, which the
    /// sink's idempotency makes harmless.
    pub async fn seed_applied_target(&self) -> Result<()> {
        let current = self.sink.current_target().await?;
        if let Some(ref target) = current {
            info!(%target, "seeded redirect mirror from current record");
        }
        self.state.lock().await.applied = current;
        Ok(())
    }

    /// Ingest a single liveness transition
    ///
    /// Events for logins outside the monitored set are logged and dropped
    /// without touching the registry; spoofed or stale subscriptions for
    /// channels no longer tracked therefore cannot move the redirect.
    pub async fn ingest(&self, login: &str, is_live: bool) -> Result<Decision> {
        let Some(index) = self.channels.position(login) else {
            warn!(channel = login, "ignoring event for unmonitored channel");
            self.emit_event(ReconcilerEvent::ChannelIgnored {
                channel: login.to_string(),
            });
            return Ok(Decision::unchanged(None));
        };

        let mut state = self.state.lock().await;
        state.live[index] = is_live;
        debug!(channel = login, is_live, "liveness flag updated");
        self.reconcile_locked(&mut state).await
    }

    /// Replace the entire live set from a bulk probe
    ///
    /// Used by the poller and the startup check so both reuse the exact
    /// decision path of single-event ingestion. Logins in `live_logins`
    /// that are not monitored are ignored.
    pub async fn ingest_bulk(&self, live_logins: &[String]) -> Result<Decision> {
        let mut state = self.state.lock().await;
        for (index, channel) in self.channels.iter().enumerate() {
            state.live[index] = live_logins.iter().any(|l| l == &channel.login);
        }
        debug!(live = live_logins.len(), "liveness registry replaced from bulk probe");
        self.reconcile_locked(&mut state).await
    }

    /// Recompute the authoritative target and drive the sink if it changed
    ///
    /// Must be called with the state lock held; the caller's guard is what
    /// makes the whole pass a single critical section.
    async fn reconcile_locked(&self, state: &mut ReconcilerState) -> Result<Decision> {
        let target = self.authoritative_target(state);

        let Some(target) = target else {
            // Nothing live and no default configured: keep whatever is
            // applied rather than clearing the record.
            debug!("no live channels and no default URL, keeping current redirect");
            return Ok(Decision::unchanged(state.applied.clone()));
        };

        if state.applied.as_deref() == Some(target.as_str()) {
            debug!(%target, "redirect already points at authoritative target");
            self.emit_event(ReconcilerEvent::RedirectUnchanged {
                target: target.clone(),
            });
            return Ok(Decision::unchanged(Some(target)));
        }

        match self.sink.set_target(&target).await {
            Ok(()) => {
                let previous = state.applied.replace(target.clone());
                info!(%target, ?previous, "redirect updated");
                self.emit_event(ReconcilerEvent::RedirectApplied {
                    target: target.clone(),
                    previous,
                });
                Ok(Decision {
                    apply: true,
                    target: Some(target),
                })
            }
            Err(e) => {
                // Mirror deliberately untouched: the next reconciliation
                // recomputes the same transition and retries it.
                error!(%target, error = %e, "failed to apply redirect");
                self.emit_event(ReconcilerEvent::RedirectApplyFailed {
                    target,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Selection rule: first live channel in declaration order, else the
    /// default URL, else nothing.
    fn authoritative_target(&self, state: &ReconcilerState) -> Option<String> {
        for (index, channel) in self.channels.iter().enumerate() {
            if state.live[index] {
                return Some(channel.stream_url.clone());
            }
        }
        self.default_url.clone()
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcilerEvent) {
        if self.event_tx.try_send(event).is_err() {
            // Receiver is slow or gone; reconciliation must not block on
            // observability.
            warn!("reconciler event channel full, dropping event");
        }
    }
}
