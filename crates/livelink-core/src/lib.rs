//! # livelink-core
//!
//! Core library for the LiveLink stream-status reconciliation engine.
//!
//! LiveLink keeps a single DNS redirect record pointed at whichever of a
//! configured set of live-stream channels is currently broadcasting,
//! falling back to a default URL when none are live.
//!
//! ## Architecture Overview
//!
//! - **webhook**: signature verification and notification decoding for
//!   inbound push events
//! - **Reconciler**: the liveness registry, the redirect-target decision,
//!   and the only call site of the redirect sink
//! - **RedirectSink** / **StreamPlatform**: traits for the two external
//!   collaborators (DNS provider, streaming platform)
//! - **subscription** / **poller**: push establishment with polling
//!   fallback
//!
//! ## Design Principles
//!
//! 1. **Single writer**: only the Reconciler mutates liveness state or the
//!    redirect mirror; everything else calls its operations
//! 2. **Deterministic selection**: multi-live ties resolve by channel
//!    declaration order, never by arrival order or map iteration
//! 3. **Decide once, apply once**: the sink is invoked only when the
//!    authoritative target actually changes
//! 4. **Failure leaves state retryable**: a failed apply never advances
//!    the mirror, so the next observation retries the same transition

pub mod channel;
pub mod config;
pub mod error;
pub mod poller;
pub mod reconciler;
pub mod subscription;
pub mod traits;
pub mod webhook;

// Re-export core types for convenience
pub use channel::{ChannelSet, MonitoredChannel};
pub use config::{EngineConfig, LiveLinkConfig, WebhookConfig};
pub use error::{Error, Result};
pub use poller::{PollerHandle, spawn_poller};
pub use reconciler::{Decision, Reconciler, ReconcilerEvent};
pub use subscription::{LivenessSource, establish_subscriptions};
pub use traits::{RedirectSink, StreamPlatform};
pub use webhook::{Notification, decode_notification, verify_signature};
