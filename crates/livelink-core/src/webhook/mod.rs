//! Inbound notification handling
//!
//! Everything needed to turn a raw webhook request into a typed event:
//! signature verification first, payload decoding second. The HTTP listener
//! itself lives in the `livelink-webhook` crate; this module is pure
//! computation over header values and body bytes.

pub mod notification;
pub mod signature;

pub use notification::{Notification, decode_notification};
pub use signature::verify_signature;
