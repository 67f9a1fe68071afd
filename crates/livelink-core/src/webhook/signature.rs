//! Webhook signature verification
//!
//! Inbound notifications carry an HMAC-SHA256 signature computed by the
//! platform over `message_id + timestamp + body` with the shared webhook
//! secret as key, hex-encoded and prefixed with `sha256=`. A request whose
//! signature does not verify must be rejected before any further
//! processing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Required prefix on the signature header value
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a notification signature
///
/// Returns true iff `signature_header` is `sha256=<hex>` where `<hex>` is
/// the HMAC-SHA256 of `message_id + timestamp + body` keyed with `secret`.
/// The digest comparison is constant-time (`Mac::verify_slice`), so a
/// mismatched signature reveals nothing about how much of it matched.
///
/// Malformed input (missing prefix, odd or non-hex digest) fails
/// verification rather than erroring; the caller treats all failures the
/// same way and must not leak the reason to the sender.
pub fn verify_signature(
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    signature_header: &str,
    secret: &str,
) -> bool {
    let Some(digest_hex) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(digest) = hex::decode(digest_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac.verify_slice(&digest).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-webhook-secret";

    /// Sign the way the platform does, for use as the expected header value
    fn sign(message_id: &str, timestamp: &str, body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(message_id.as_bytes());
        mac.update(timestamp.as_bytes());
        mac.update(body);
        format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn matching_signature_verifies() {
        let body = br#"{"subscription":{"type":"stream.online"}}"#;
        let header = sign("msg-1", "2024-01-01T00:00:00Z", body, SECRET);
        assert!(verify_signature(
            "msg-1",
            "2024-01-01T00:00:00Z",
            body,
            &header,
            SECRET
        ));
    }

    #[test]
    fn mutated_body_fails() {
        let body = b"payload";
        let header = sign("msg-1", "ts", body, SECRET);
        assert!(!verify_signature("msg-1", "ts", b"payloae", &header, SECRET));
    }

    #[test]
    fn mutated_message_id_fails() {
        let body = b"payload";
        let header = sign("msg-1", "ts", body, SECRET);
        assert!(!verify_signature("msg-2", "ts", body, &header, SECRET));
    }

    #[test]
    fn mutated_timestamp_fails() {
        let body = b"payload";
        let header = sign("msg-1", "ts", body, SECRET);
        assert!(!verify_signature("msg-1", "tz", body, &header, SECRET));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"payload";
        let header = sign("msg-1", "ts", body, SECRET);
        assert!(!verify_signature("msg-1", "ts", body, &header, "other-secret"));
    }

    #[test]
    fn missing_prefix_fails() {
        let body = b"payload";
        let header = sign("msg-1", "ts", body, SECRET);
        let bare = header.strip_prefix(SIGNATURE_PREFIX).unwrap();
        assert!(!verify_signature("msg-1", "ts", body, bare, SECRET));
    }

    #[test]
    fn malformed_hex_fails() {
        assert!(!verify_signature(
            "msg-1",
            "ts",
            b"payload",
            "sha256=not-hex-at-all",
            SECRET
        ));
    }
}
