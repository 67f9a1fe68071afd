// # Twitch Platform Client
//
// This crate implements the `StreamPlatform` trait against the Twitch
// Helix API:
//
// - App access token via the client-credentials grant (fetched once at
//   startup; this process outlives no token, so no refresh loop)
// - Login → user-ID resolution (`GET /helix/users`)
// - Bulk liveness query (`GET /helix/streams`)
// - EventSub webhook subscription registration
//   (`POST /helix/eventsub/subscriptions`, 202 = accepted)
//
// The client holds no liveness state; the reconciler owns that view.
//
// ## Security
//
// - Client secret and access token NEVER appear in logs or Debug output

use std::time::Duration;

use async_trait::async_trait;
use livelink_core::channel::{ChannelSet, MonitoredChannel};
use livelink_core::traits::StreamPlatform;
use livelink_core::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Helix API base URL
const HELIX_API_BASE: &str = "https://api.twitch.tv/helix";

/// OAuth token endpoint
const OAUTH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Status code Twitch answers with when an EventSub subscription is accepted
const EVENTSUB_ACCEPTED: u16 = 202;

/// Maximum user IDs per streams query page
const MAX_STREAMS_PAGE: usize = 100;

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Twitch Helix platform client
pub struct TwitchPlatform {
    /// Application client ID (sent as the Client-Id header)
    client_id: String,

    /// App access token from the client-credentials grant
    /// ⚠️ NEVER log this value
    access_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the access token
impl std::fmt::Debug for TwitchPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchPlatform")
            .field("client_id", &self.client_id)
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

#[derive(Deserialize)]
struct HelixUser {
    id: String,
    login: String,
}

#[derive(Deserialize)]
struct StreamsResponse {
    data: Vec<HelixStream>,
}

#[derive(Deserialize)]
struct HelixStream {
    user_id: String,
}

impl TwitchPlatform {
    /// Authenticate and build a platform client
    ///
    /// Fetches an app access token via the client-credentials grant. A
    /// refused grant is a fatal startup condition for the daemon.
    pub async fn connect(client_id: impl Into<String>, client_secret: &str) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(Error::config("Twitch client ID and secret cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        let response = client
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| Error::platform(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::auth(format!(
                "Twitch refused the client-credentials grant (status {})",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::platform(format!("failed to parse token response: {e}")))?;

        info!("authenticated against the Twitch API");

        Ok(Self {
            client_id,
            access_token: token.access_token,
            client,
        })
    }

    /// GET a Helix endpoint with auth headers and a set of query pairs
    async fn helix_get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{HELIX_API_BASE}/{path}"))
            .query(query)
            .header("Client-Id", &self.client_id)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::platform(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(format!(
                    "Twitch rejected the app access token (status {status})"
                )),
                _ => Error::platform(format!("{path} query failed: {status} - {error_text}")),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::platform(format!("failed to parse {path} response: {e}")))
    }
}

#[async_trait]
impl StreamPlatform for TwitchPlatform {
    /// Resolve configured logins to monitored channels
    ///
    /// ```http
    /// GET /helix/users?login=a&login=b
    /// ```
    ///
    /// Results come back in arbitrary order; they are reordered to the
    /// declaration order of `logins` because that order is the tie-break
    /// for redirect decisions. Unknown logins are logged and dropped;
    /// resolving none at all is an error.
    async fn resolve_channels(&self, logins: &[String]) -> Result<Vec<MonitoredChannel>> {
        if logins.is_empty() {
            return Err(Error::config("no channel logins to resolve"));
        }

        let query: Vec<(&str, &str)> =
            logins.iter().map(|login| ("login", login.as_str())).collect();
        let users: UsersResponse = self.helix_get("users", &query).await?;

        let channels = order_resolved(logins, &users.data);
        for channel in &channels {
            info!(
                channel = %channel.login,
                user_id = %channel.user_id,
                "resolved monitored channel"
            );
        }
        if channels.len() < logins.len() {
            for login in logins {
                if !channels.iter().any(|c| &c.login == login) {
                    warn!(channel = %login, "channel not found on Twitch");
                }
            }
        }

        if channels.is_empty() {
            return Err(Error::platform("none of the configured channels exist"));
        }
        Ok(channels)
    }

    /// Query which monitored channels are currently live
    ///
    /// ```http
    /// GET /helix/streams?user_id=..&user_id=..&first=100
    /// ```
    async fn live_channels(&self, channels: &ChannelSet) -> Result<Vec<String>> {
        if channels.is_empty() {
            return Err(Error::platform("no channels initialized"));
        }

        let first = MAX_STREAMS_PAGE.to_string();
        let mut query: Vec<(&str, &str)> = channels
            .iter()
            .map(|channel| ("user_id", channel.user_id.as_str()))
            .collect();
        query.push(("first", first.as_str()));

        let streams: StreamsResponse = self.helix_get("streams", &query).await?;

        let live: Vec<String> = streams
            .data
            .iter()
            .filter_map(|stream| {
                channels
                    .iter()
                    .find(|channel| channel.user_id == stream.user_id)
                    .map(|channel| channel.login.clone())
            })
            .collect();

        debug!(live = live.len(), "liveness probe completed");
        Ok(live)
    }

    /// Register online and offline EventSub webhooks for one channel
    ///
    /// ```http
    /// POST /helix/eventsub/subscriptions
    /// { "type": "stream.online", "version": "1",
    ///   "condition": { "broadcaster_user_id": ... },
    ///   "transport": { "method": "webhook", "callback": ..., "secret": ... } }
    /// ```
    async fn subscribe_channel(
        &self,
        channel: &MonitoredChannel,
        callback_url: &str,
        secret: &str,
    ) -> Result<()> {
        for event_type in ["stream.online", "stream.offline"] {
            let payload = serde_json::json!({
                "type": event_type,
                "version": "1",
                "condition": { "broadcaster_user_id": channel.user_id },
                "transport": {
                    "method": "webhook",
                    "callback": callback_url,
                    "secret": secret,
                },
            });

            let response = self
                .client
                .post(format!("{HELIX_API_BASE}/eventsub/subscriptions"))
                .header("Client-Id", &self.client_id)
                .bearer_auth(&self.access_token)
                .json(&payload)
                .send()
                .await
                .map_err(|e| Error::platform(format!("subscription request failed: {e}")))?;

            let status = response.status();
            if status.as_u16() != EVENTSUB_ACCEPTED {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read error response".to_string());
                return Err(Error::platform(format!(
                    "{event_type} subscription for {} refused: {status} - {error_text}",
                    channel.login
                )));
            }
        }
        Ok(())
    }

    fn platform_name(&self) -> &'static str {
        "twitch"
    }
}

/// Canonical stream URL for a login
fn stream_url_for(login: &str) -> String {
    format!("https://twitch.tv/{login}")
}

/// Map resolved users back onto the declaration order of the configured logins
fn order_resolved(logins: &[String], users: &[HelixUser]) -> Vec<MonitoredChannel> {
    logins
        .iter()
        .filter_map(|login| {
            users
                .iter()
                .find(|user| &user.login == login)
                .map(|user| MonitoredChannel::new(&user.login, &user.id, stream_url_for(login)))
        })
        .collect()
}
