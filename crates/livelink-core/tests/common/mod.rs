//! Test doubles and common utilities for reconciliation contract tests
//!
//! These doubles count calls and can be told to fail, so the tests can
//! assert on how often and with what the core drives its collaborators.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use livelink_core::channel::{ChannelSet, MonitoredChannel};
use livelink_core::error::{Error, Result};
use livelink_core::traits::{RedirectSink, StreamPlatform};

/// Build a monitored channel with a synthetic user ID
pub fn channel(login: &str) -> MonitoredChannel {
    MonitoredChannel::new(
        login,
        format!("id-{login}"),
        format!("https://twitch.tv/{login}"),
    )
}

/// Build a channel set in the given declaration order
pub fn channel_set(logins: &[&str]) -> ChannelSet {
    ChannelSet::new(logins.iter().map(|login| channel(login)).collect())
}

/// Stream URL the mock channels carry
pub fn url_of(login: &str) -> String {
    format!("https://twitch.tv/{login}")
}

/// A mock RedirectSink that tracks calls and can fail on demand
pub struct MockRedirectSink {
    /// Call counter for set_target()
    set_calls: Arc<AtomicUsize>,
    /// Every target that was successfully applied, in order
    applied: Arc<std::sync::Mutex<Vec<String>>>,
    /// Number of upcoming set_target() calls that will fail
    fail_remaining: Arc<AtomicUsize>,
    /// Target reported by current_target()
    initial_target: Option<String>,
}

impl MockRedirectSink {
    pub fn new() -> Self {
        Self {
            set_calls: Arc::new(AtomicUsize::new(0)),
            applied: Arc::new(std::sync::Mutex::new(Vec::new())),
            fail_remaining: Arc::new(AtomicUsize::new(0)),
            initial_target: None,
        }
    }

    /// Report an already-applied target from current_target()
    pub fn with_initial_target(mut self, target: &str) -> Self {
        self.initial_target = Some(target.to_string());
        self
    }

    /// Make the next `n` set_target() calls fail
    pub fn fail_times(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Get the number of times set_target() was called (including failures)
    pub fn set_call_count(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Get the targets that were successfully applied
    pub fn applied_targets(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    /// Create a new MockRedirectSink that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            set_calls: Arc::clone(&other.set_calls),
            applied: Arc::clone(&other.applied),
            fail_remaining: Arc::clone(&other.fail_remaining),
            initial_target: other.initial_target.clone(),
        }
    }
}

#[async_trait]
impl RedirectSink for MockRedirectSink {
    async fn current_target(&self) -> Result<Option<String>> {
        Ok(self.initial_target.clone())
    }

    async fn set_target(&self, target_url: &str) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::sink("mock", "simulated apply failure"));
        }

        self.applied.lock().unwrap().push(target_url.to_string());
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "mock"
    }
}

/// A mock StreamPlatform with a controllable live set
pub struct MockPlatform {
    /// Channels resolve_channels() answers with
    channels: Vec<MonitoredChannel>,
    /// Logins currently reported live by live_channels()
    live: Arc<std::sync::Mutex<Vec<String>>>,
    /// Call counter for live_channels()
    probe_calls: Arc<AtomicUsize>,
    /// When true, live_channels() fails
    fail_probe: Arc<std::sync::atomic::AtomicBool>,
    /// Logins whose subscribe_channel() fails
    fail_subscribe: HashSet<String>,
}

impl MockPlatform {
    pub fn new(logins: &[&str]) -> Self {
        Self {
            channels: logins.iter().map(|login| channel(login)).collect(),
            live: Arc::new(std::sync::Mutex::new(Vec::new())),
            probe_calls: Arc::new(AtomicUsize::new(0)),
            fail_probe: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            fail_subscribe: HashSet::new(),
        }
    }

    /// Make subscribe_channel() fail for the given logins
    pub fn failing_subscriptions(mut self, logins: &[&str]) -> Self {
        self.fail_subscribe = logins.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Set the logins the next probes report live
    pub fn set_live(&self, logins: &[&str]) {
        *self.live.lock().unwrap() = logins.iter().map(|l| l.to_string()).collect();
    }

    /// Make probes fail until set_live() semantics are restored
    pub fn set_probe_failing(&self, failing: bool) {
        self.fail_probe.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times live_channels() was called
    pub fn probe_call_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamPlatform for MockPlatform {
    async fn resolve_channels(&self, _logins: &[String]) -> Result<Vec<MonitoredChannel>> {
        Ok(self.channels.clone())
    }

    async fn live_channels(&self, _channels: &ChannelSet) -> Result<Vec<String>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(Error::platform("simulated probe failure"));
        }
        Ok(self.live.lock().unwrap().clone())
    }

    async fn subscribe_channel(
        &self,
        channel: &MonitoredChannel,
        _callback_url: &str,
        _secret: &str,
    ) -> Result<()> {
        if self.fail_subscribe.contains(&channel.login) {
            return Err(Error::platform("simulated subscription failure"));
        }
        Ok(())
    }

    fn platform_name(&self) -> &'static str {
        "mock"
    }
}
