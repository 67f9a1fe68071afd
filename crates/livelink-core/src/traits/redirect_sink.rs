// # Redirect Sink Trait
//
// Defines the interface for applying a target URL to the managed redirect
// record.
//
// ## Implementations
//
// - Cloudflare: `livelink-dns-cloudflare` crate
// - Future: Route53, DigitalOcean, etc.

use async_trait::async_trait;

/// Trait for redirect sink implementations
///
/// A sink owns exactly one DNS redirect record and knows how to point it at
/// a URL. It performs one API exchange per call and decides nothing: whether
/// an update is needed, and when a failed update is retried, is owned by the
/// [`Reconciler`](crate::Reconciler). Implementations must not retry, back
/// off, cache decision state, or spawn background tasks.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RedirectSink: Send + Sync {
    /// Read the target the record currently points at
    ///
    /// Used once at startup to seed the reconciler's mirror so a restart
    /// does not re-apply an unchanged target. `Ok(None)` means the record
    /// exists but has no usable content.
    async fn current_target(&self) -> Result<Option<String>, crate::Error>;

    /// Point the record at `target_url`
    ///
    /// # Idempotency
    ///
    /// This method must be idempotent: applying the same target twice is
    /// safe and results in no change after the first successful call.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The record now points at `target_url`
    /// - `Err(Error)`: The record is unchanged (caller will retry on the
    ///   next reconciliation)
    async fn set_target(&self, target_url: &str) -> Result<(), crate::Error>;

    /// Get the sink name (for logging/debugging)
    fn sink_name(&self) -> &'static str;
}
