// # Cloudflare Redirect Sink
//
// This crate points the managed redirect record (a CNAME) at a target URL
// via the Cloudflare API v4.
//
// The sink is single-shot by design: one API exchange per call, full error
// propagation to the reconciler, which owns the retry policy. No retry, no
// backoff, no caching of decision state, no background tasks.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=CNAME`
// - Read DNS Record: GET `/zones/:zone_id/dns_records/:record_id`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
//
// ## Security
//
// - The API token NEVER appears in logs or Debug output
// - The sink fails construction if the token is empty

use std::time::Duration;

use async_trait::async_trait;
use livelink_core::traits::RedirectSink;
use livelink_core::{Error, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for API requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Record type used for URL redirects
const REDIRECT_RECORD_TYPE: &str = "CNAME";

/// Cloudflare redirect sink
///
/// Bound to exactly one record, discovered once at startup by
/// [`CloudflareRedirect::discover`]. The record's TTL and proxied flag are
/// preserved on every update; only the content changes.
pub struct CloudflareRedirect {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone the record lives in
    zone_id: String,

    /// Fully qualified record name, e.g. "live.example.com"
    record_name: String,

    /// Record ID within the zone
    record_id: String,

    /// TTL carried over from the discovered record
    ttl: u32,

    /// Proxied flag carried over from the discovered record
    proxied: bool,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRedirect")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("record_name", &self.record_name)
            .field("record_id", &self.record_id)
            .finish()
    }
}

impl CloudflareRedirect {
    /// Find the managed record and build a sink bound to it
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Zone the record lives in
    /// - `domain`: Zone apex domain, e.g. "example.com"
    /// - `record`: Record host label, e.g. "live"
    ///
    /// # Errors
    ///
    /// Fails when the token is empty, the API rejects the request, or no
    /// CNAME record with the expected name exists. All of these are fatal
    /// startup conditions for the daemon.
    pub async fn discover(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        domain: &str,
        record: &str,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        let zone_id = zone_id.into();
        let record_name = qualified_record_name(record, domain);

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        let url = format!(
            "{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records?name={record_name}&type={REDIRECT_RECORD_TYPE}"
        );
        let response = client
            .get(&url)
            .bearer_auth(&api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::sink("cloudflare", format!("HTTP request failed: {e}")))?;
        let json = read_api_response(response, "record lookup").await?;

        let records = json["result"]
            .as_array()
            .ok_or_else(|| Error::sink("cloudflare", "invalid response format: result is not an array"))?;
        let found = records.first().ok_or_else(|| {
            Error::not_found(format!("no {REDIRECT_RECORD_TYPE} record named {record_name}"))
        })?;

        let record_id = found["id"]
            .as_str()
            .ok_or_else(|| Error::sink("cloudflare", "invalid response format: record.id is not a string"))?
            .to_string();
        let ttl = found["ttl"].as_u64().unwrap_or(1) as u32;
        let proxied = found["proxied"].as_bool().unwrap_or(false);

        info!(
            record = %record_name,
            record_id = %record_id,
            "found Cloudflare redirect record"
        );

        Ok(Self {
            api_token,
            zone_id,
            record_name,
            record_id,
            ttl,
            proxied,
            client,
        })
    }

    fn record_url(&self) -> String {
        format!(
            "{CLOUDFLARE_API_BASE}/zones/{}/dns_records/{}",
            self.zone_id, self.record_id
        )
    }
}

#[async_trait]
impl RedirectSink for CloudflareRedirect {
    /// Read the record's current content
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    /// ```
    async fn current_target(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.record_url())
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::sink("cloudflare", format!("HTTP request failed: {e}")))?;
        let json = read_api_response(response, "record read").await?;

        Ok(json["result"]["content"].as_str().map(str::to_string))
    }

    /// Repoint the record at `target_url`
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "CNAME", "name": ..., "content": target, "ttl": ..., "proxied": ... }
    /// ```
    async fn set_target(&self, target_url: &str) -> Result<()> {
        debug!(record = %self.record_name, target = target_url, "updating redirect record");

        let payload = serde_json::json!({
            "type": REDIRECT_RECORD_TYPE,
            "name": self.record_name,
            "content": target_url,
            "ttl": self.ttl,
            "proxied": self.proxied,
        });

        let response = self
            .client
            .put(self.record_url())
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::sink("cloudflare", format!("HTTP request failed: {e}")))?;
        read_api_response(response, "record update").await?;

        info!(record = %self.record_name, target = target_url, "redirect record updated");
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Map a Cloudflare API response to JSON or a status-specific error
async fn read_api_response(response: reqwest::Response, context: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string());

        return Err(match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Cloudflare rejected the API token or its permissions during {context} (status {status})"
            )),
            404 => Error::not_found(format!("Cloudflare {context}: {error_text}")),
            429 => Error::sink(
                "cloudflare",
                format!("rate limit exceeded during {context} (status {status})"),
            ),
            500..=599 => Error::sink(
                "cloudflare",
                format!("server error (transient) during {context}: {status} - {error_text}"),
            ),
            _ => Error::sink(
                "cloudflare",
                format!("{context} failed: {status} - {error_text}"),
            ),
        });
    }

    response
        .json()
        .await
        .map_err(|e| Error::sink("cloudflare", format!("failed to parse response: {e}")))
}

/// Join a record host label with the zone apex
///
/// An empty or "@" record label means the apex itself.
fn qualified_record_name(record: &str, domain: &str) -> String {
    if record.is_empty() || record == "@" {
        domain.to_string()
    } else {
        format!("{record}.{domain}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_joins_label_and_domain() {
        assert_eq!(qualified_record_name("live", "example.com"), "live.example.com");
    }

    #[test]
    fn apex_labels_resolve_to_domain() {
        assert_eq!(qualified_record_name("", "example.com"), "example.com");
        assert_eq!(qualified_record_name("@", "example.com"), "example.com");
    }

    #[test]
    fn api_token_not_exposed_in_debug() {
        let sink = CloudflareRedirect {
            api_token: "secret_token_12345".to_string(),
            zone_id: "zone".to_string(),
            record_name: "live.example.com".to_string(),
            record_id: "rec".to_string(),
            ttl: 1,
            proxied: true,
            client: reqwest::Client::new(),
        };

        let debug_str = format!("{:?}", sink);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("CloudflareRedirect"));
    }

    #[test]
    fn sink_name_is_cloudflare() {
        let sink = CloudflareRedirect {
            api_token: "token".to_string(),
            zone_id: "zone".to_string(),
            record_name: "live.example.com".to_string(),
            record_id: "rec".to_string(),
            ttl: 300,
            proxied: false,
            client: reqwest::Client::new(),
        };
        assert_eq!(sink.sink_name(), "cloudflare");
    }
}
