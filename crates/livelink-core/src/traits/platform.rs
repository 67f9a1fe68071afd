// # Stream Platform Trait
//
// Defines the interface against the streaming platform's REST API.
//
// ## Implementations
//
// - Twitch Helix: `livelink-platform-twitch` crate

use async_trait::async_trait;

use crate::channel::{ChannelSet, MonitoredChannel};

/// Trait for streaming-platform client implementations
///
/// The platform client is a thin API wrapper: it resolves configured logins
/// to platform identities, answers "who is live right now", and registers
/// push subscriptions. It holds no liveness state of its own; the
/// [`Reconciler`](crate::Reconciler) is the single source of truth for that.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait StreamPlatform: Send + Sync {
    /// Resolve configured logins to monitored channels
    ///
    /// Called once at startup. The returned channels must preserve the
    /// declaration order of `logins`. Logins the platform does not know are
    /// logged and dropped by the implementation; resolving none of them is
    /// an error.
    async fn resolve_channels(
        &self,
        logins: &[String],
    ) -> Result<Vec<MonitoredChannel>, crate::Error>;

    /// Query which of the monitored channels are currently live
    ///
    /// Returns the logins of live channels, in no particular order. Used by
    /// the startup probe and the polling fallback.
    async fn live_channels(&self, channels: &ChannelSet) -> Result<Vec<String>, crate::Error>;

    /// Register push subscriptions for one channel's liveness transitions
    ///
    /// Registers both the online and the offline notification against the
    /// given callback URL, keyed with `secret`. Either registration being
    /// refused is an error; the caller decides whether that disables the
    /// push mechanism as a whole.
    async fn subscribe_channel(
        &self,
        channel: &MonitoredChannel,
        callback_url: &str,
        secret: &str,
    ) -> Result<(), crate::Error>;

    /// Get the platform name (for logging/debugging)
    fn platform_name(&self) -> &'static str;
}
