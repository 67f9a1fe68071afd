// # Webhook Listener
//
// Receives EventSub push notifications and feeds them through the core's
// verify → decode → ingest pipeline. One route does all the work; the
// daemon owns binding and serving.
//
// Response contract:
// - `401` missing or failing signature (no internal detail leaked)
// - `400` payload that verifies but does not decode
// - `200` plain-text challenge echo for the subscription handshake
// - `200` handled liveness event, and also ignored-but-valid events
//   (unmonitored channels, unrecognized types); a failing redirect apply
//   is internal retry policy, not the sender's concern

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tracing::{error, info, warn};

use livelink_core::webhook::{Notification, decode_notification, verify_signature};
use livelink_core::Reconciler;

/// Header carrying the unique message ID
pub const HEADER_MESSAGE_ID: &str = "Twitch-Eventsub-Message-Id";

/// Header carrying the message timestamp
pub const HEADER_MESSAGE_TIMESTAMP: &str = "Twitch-Eventsub-Message-Timestamp";

/// Header carrying the HMAC signature
pub const HEADER_MESSAGE_SIGNATURE: &str = "Twitch-Eventsub-Message-Signature";

/// Header carrying the message type
pub const HEADER_MESSAGE_TYPE: &str = "Twitch-Eventsub-Message-Type";

/// Shared state for the webhook handlers
pub struct WebhookState {
    /// Reconciliation engine all liveness events funnel into
    pub reconciler: Arc<Reconciler>,

    /// Shared secret for notification signatures
    /// ⚠️ NEVER log this value
    pub secret: String,
}

/// Build the webhook router
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_notification))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

async fn handle_health() -> impl IntoResponse {
    StatusCode::OK
}

async fn handle_notification(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(message_id), Some(timestamp), Some(signature)) = (
        header_str(&headers, HEADER_MESSAGE_ID),
        header_str(&headers, HEADER_MESSAGE_TIMESTAMP),
        header_str(&headers, HEADER_MESSAGE_SIGNATURE),
    ) else {
        warn!("notification missing signature headers");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    if !verify_signature(message_id, timestamp, &body, signature, &state.secret) {
        warn!("notification failed signature verification");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let message_type = header_str(&headers, HEADER_MESSAGE_TYPE).unwrap_or("");
    let notification = match decode_notification(&body, message_type) {
        Ok(notification) => notification,
        Err(error) => {
            warn!(%error, "failed to decode notification");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match notification {
        Notification::Handshake { challenge } => {
            info!("answering webhook verification challenge");
            ([(header::CONTENT_TYPE, "text/plain")], challenge).into_response()
        }
        Notification::StreamOnline { channel } => {
            info!(%channel, "stream online notification received");
            ingest_and_respond(&state, &channel, true).await
        }
        Notification::StreamOffline { channel } => {
            info!(%channel, "stream offline notification received");
            ingest_and_respond(&state, &channel, false).await
        }
        Notification::Unrecognized { event_type } => {
            info!(%event_type, "ignoring unrecognized notification type");
            StatusCode::OK.into_response()
        }
    }
}

async fn ingest_and_respond(state: &WebhookState, channel: &str, is_live: bool) -> Response {
    if let Err(error) = state.reconciler.ingest(channel, is_live).await {
        // The event was authentic and valid; the apply failure is retried
        // on the next reconciliation, so the sender still gets a 200.
        error!(%error, channel, "failed to apply redirect for liveness change");
    }
    StatusCode::OK.into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
