//! Configuration types for the LiveLink system
//!
//! This module defines the configuration structures consumed by the core.
//! Loading values from the environment and failing fast on missing ones is
//! the daemon's job; the core only validates shape and ranges.

use serde::{Deserialize, Serialize};

/// Main LiveLink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveLinkConfig {
    /// Channel logins to monitor, in declaration order.
    ///
    /// Declaration order is load-bearing: when several channels are live at
    /// once, the redirect points at the first declared one.
    pub channels: Vec<String>,

    /// URL the redirect falls back to when no channel is live.
    ///
    /// With no default configured, the previously applied target is kept.
    #[serde(default)]
    pub default_url: Option<String>,

    /// Webhook callback settings
    pub webhook: WebhookConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl LiveLinkConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.channels.is_empty() {
            return Err(crate::Error::config("no channels configured"));
        }
        for login in &self.channels {
            if login.trim().is_empty() {
                return Err(crate::Error::config("channel login cannot be empty"));
            }
        }

        self.webhook.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Webhook callback configuration
///
/// The callback URL is handed to the platform when registering push
/// subscriptions; the secret keys the HMAC on every inbound notification.
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Publicly reachable callback URL registered with the platform
    pub callback_url: String,

    /// Shared secret for notification signatures
    /// ⚠️ NEVER log this value
    pub secret: String,
}

impl WebhookConfig {
    /// Validate the webhook configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.callback_url.is_empty() {
            return Err(crate::Error::config("webhook callback URL cannot be empty"));
        }
        if !self.callback_url.starts_with("https://") && !self.callback_url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "webhook callback URL must use HTTP or HTTPS scheme, got: {}",
                self.callback_url
            )));
        }
        if self.secret.is_empty() {
            return Err(crate::Error::config("webhook secret cannot be empty"));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the shared secret
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("callback_url", &self.callback_url)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between liveness probes when falling back to polling (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the internal reconciler event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// blocking reconciliation.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(10..=3600).contains(&self.poll_interval_secs) {
            return Err(crate::Error::config(format!(
                "poll interval must be between 10 and 3600 seconds, got: {}",
                self.poll_interval_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "event channel capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    1000
}
