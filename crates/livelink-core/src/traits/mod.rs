//! Core traits for the LiveLink system
//!
//! This module defines the abstract interfaces for the two external
//! collaborators:
//!
//! - [`RedirectSink`]: apply a target URL to the managed redirect record
//! - [`StreamPlatform`]: resolve channels, probe liveness, register push
//!   subscriptions

pub mod platform;
pub mod redirect_sink;

pub use platform::StreamPlatform;
pub use redirect_sink::RedirectSink;
