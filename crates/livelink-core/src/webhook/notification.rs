//! Notification payload decoding
//!
//! Verified webhook bodies are decoded into a closed [`Notification`]
//! variant at the boundary; nothing downstream touches raw JSON. Event
//! types this system does not track decode to `Unrecognized`, which is
//! logged and acknowledged, not treated as an error.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Message-type header value announcing a subscription handshake
pub const MESSAGE_TYPE_VERIFICATION: &str = "webhook_callback_verification";

/// Subscription type for channel-went-live notifications
pub const EVENT_STREAM_ONLINE: &str = "stream.online";

/// Subscription type for channel-went-offline notifications
pub const EVENT_STREAM_OFFLINE: &str = "stream.offline";

/// A decoded inbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A monitored channel started broadcasting
    StreamOnline {
        /// Channel login the event is about
        channel: String,
    },

    /// A monitored channel stopped broadcasting
    StreamOffline {
        /// Channel login the event is about
        channel: String,
    },

    /// Subscription handshake; the listener must echo the challenge verbatim
    Handshake {
        /// Challenge string to echo back as plain text
        challenge: String,
    },

    /// An event type this system does not track (acknowledged, ignored)
    Unrecognized {
        /// The subscription type as received
        event_type: String,
    },
}

#[derive(Deserialize)]
struct ChallengePayload {
    challenge: String,
}

#[derive(Deserialize)]
struct Envelope {
    subscription: SubscriptionInfo,
    #[serde(default)]
    event: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct SubscriptionInfo {
    #[serde(rename = "type")]
    kind: String,
}

/// Decode a verified notification body
///
/// `message_type` is the notification's message-type header value. A
/// handshake body is `{"challenge": "..."}`; everything else is an
/// envelope with `subscription.type` and an open `event` mapping from which
/// liveness transitions take `broadcaster_user_login`.
///
/// # Errors
///
/// Malformed JSON or a liveness event without `broadcaster_user_login`
/// yields [`Error::Decode`]; the listener answers with a client error and
/// mutates no state.
pub fn decode_notification(body: &[u8], message_type: &str) -> Result<Notification> {
    if message_type == MESSAGE_TYPE_VERIFICATION {
        let payload: ChallengePayload = serde_json::from_slice(body)
            .map_err(|e| Error::decode(format!("invalid verification challenge: {e}")))?;
        return Ok(Notification::Handshake {
            challenge: payload.challenge,
        });
    }

    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("invalid notification envelope: {e}")))?;

    match envelope.subscription.kind.as_str() {
        EVENT_STREAM_ONLINE | EVENT_STREAM_OFFLINE => {
            let channel = envelope
                .event
                .get("broadcaster_user_login")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::decode("notification event is missing broadcaster_user_login")
                })?
                .to_string();

            if envelope.subscription.kind == EVENT_STREAM_ONLINE {
                Ok(Notification::StreamOnline { channel })
            } else {
                Ok(Notification::StreamOffline { channel })
            }
        }
        other => Ok(Notification::Unrecognized {
            event_type: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_decodes_challenge() {
        let body = br#"{"challenge":"abc123"}"#;
        let decoded = decode_notification(body, MESSAGE_TYPE_VERIFICATION).unwrap();
        assert_eq!(
            decoded,
            Notification::Handshake {
                challenge: "abc123".to_string()
            }
        );
    }

    #[test]
    fn online_event_extracts_login() {
        let body = br#"{
            "subscription": {"id": "sub-1", "type": "stream.online"},
            "event": {"broadcaster_user_login": "alice", "broadcaster_user_id": "1"}
        }"#;
        let decoded = decode_notification(body, "notification").unwrap();
        assert_eq!(
            decoded,
            Notification::StreamOnline {
                channel: "alice".to_string()
            }
        );
    }

    #[test]
    fn offline_event_extracts_login() {
        let body = br#"{
            "subscription": {"type": "stream.offline"},
            "event": {"broadcaster_user_login": "bob"}
        }"#;
        let decoded = decode_notification(body, "notification").unwrap();
        assert_eq!(
            decoded,
            Notification::StreamOffline {
                channel: "bob".to_string()
            }
        );
    }

    #[test]
    fn missing_login_is_a_decode_failure() {
        let body = br#"{
            "subscription": {"type": "stream.online"},
            "event": {"broadcaster_user_id": "1"}
        }"#;
        assert!(decode_notification(body, "notification").is_err());
    }

    #[test]
    fn unknown_event_type_is_unrecognized() {
        let body = br#"{
            "subscription": {"type": "channel.follow"},
            "event": {"broadcaster_user_login": "alice"}
        }"#;
        let decoded = decode_notification(body, "notification").unwrap();
        assert_eq!(
            decoded,
            Notification::Unrecognized {
                event_type: "channel.follow".to_string()
            }
        );
    }

    #[test]
    fn malformed_json_is_a_decode_failure() {
        assert!(decode_notification(b"{not json", "notification").is_err());
        assert!(decode_notification(b"{not json", MESSAGE_TYPE_VERIFICATION).is_err());
    }

    #[test]
    fn envelope_without_event_mapping_is_unrecognized_for_other_types() {
        let body = br#"{"subscription": {"type": "user.update"}}"#;
        let decoded = decode_notification(body, "notification").unwrap();
        assert_eq!(
            decoded,
            Notification::Unrecognized {
                event_type: "user.update".to_string()
            }
        );
    }
}
