//! Push-subscription establishment
//!
//! At startup the system tries to register push notifications for every
//! monitored channel. The outcome decides the liveness source for the
//! whole process: push when the mechanism works at all, polling when the
//! very first attempt already fails (a transport-level failure means no
//! notification will ever arrive). Per-channel refusals after a working
//! first attempt are logged and tolerated.

use tracing::{info, warn};

use crate::channel::ChannelSet;
use crate::traits::StreamPlatform;

/// Where liveness observations come from for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessSource {
    /// Webhook push notifications are registered
    Push,

    /// Push registration failed; the poller runs instead
    Poll,
}

/// Register push subscriptions for all monitored channels
///
/// Returns the liveness source the process should use. Never fails: every
/// error is either the fallback trigger or a logged per-channel loss.
pub async fn establish_subscriptions(
    platform: &dyn StreamPlatform,
    channels: &ChannelSet,
    callback_url: &str,
    secret: &str,
) -> LivenessSource {
    for (index, channel) in channels.iter().enumerate() {
        match platform.subscribe_channel(channel, callback_url, secret).await {
            Ok(()) => {
                info!(channel = %channel.login, "subscribed to stream status events");
            }
            Err(error) if index == 0 => {
                warn!(
                    channel = %channel.login,
                    %error,
                    "subscription mechanism unusable, falling back to polling"
                );
                return LivenessSource::Poll;
            }
            Err(error) => {
                warn!(channel = %channel.login, %error, "failed to subscribe channel");
            }
        }
    }
    LivenessSource::Push
}
