//! Contract Test: Apply Failure & Retry
//!
//! Verifies that a failing redirect apply never corrupts state:
//! - The mirror only advances after a successful sink call
//! - The same transition is re-attempted by the next reconciliation
//!   instead of being silently swallowed

mod common;

use common::*;
use livelink_core::Reconciler;

fn reconciler_with(logins: &[&str], sink: MockRedirectSink) -> Reconciler {
    let (reconciler, _event_rx) =
        Reconciler::new(channel_set(logins), None, Box::new(sink), 100);
    reconciler
}

#[tokio::test]
async fn failed_apply_leaves_the_mirror_for_retry() {
    let sink = MockRedirectSink::new();
    let sink_view = MockRedirectSink::sharing_counters_with(&sink);
    let reconciler = reconciler_with(&["alice", "bob"], sink);

    sink_view.fail_times(1);
    let result = reconciler.ingest("alice", true).await;
    assert!(result.is_err(), "failed apply must surface the error");
    assert_eq!(sink_view.set_call_count(), 1);
    assert!(sink_view.applied_targets().is_empty());

    // Same observation again: the mirror never advanced, so the identical
    // transition is retried, not swallowed
    let decision = reconciler.ingest("alice", true).await.unwrap();
    assert!(decision.apply);
    assert_eq!(sink_view.set_call_count(), 2);
    assert_eq!(sink_view.applied_targets(), vec![url_of("alice")]);
}

#[tokio::test]
async fn retry_happens_on_the_next_differing_event_too() {
    let sink = MockRedirectSink::new();
    let sink_view = MockRedirectSink::sharing_counters_with(&sink);
    let reconciler = reconciler_with(&["alice", "bob"], sink);

    sink_view.fail_times(1);
    assert!(reconciler.ingest("alice", true).await.is_err());

    // A different channel going live re-runs the decision; alice still wins
    // by declaration order and her target finally lands
    let decision = reconciler.ingest("bob", true).await.unwrap();
    assert!(decision.apply);
    assert_eq!(sink_view.applied_targets(), vec![url_of("alice")]);
}

#[tokio::test]
async fn success_after_failure_suppresses_further_calls() {
    let sink = MockRedirectSink::new();
    let sink_view = MockRedirectSink::sharing_counters_with(&sink);
    let reconciler = reconciler_with(&["alice", "bob"], sink);

    sink_view.fail_times(1);
    assert!(reconciler.ingest("alice", true).await.is_err());
    assert!(reconciler.ingest("alice", true).await.unwrap().apply);

    // Now that the mirror reflects the applied target, the decision is a no-op
    let decision = reconciler.ingest("alice", true).await.unwrap();
    assert!(!decision.apply);
    assert_eq!(sink_view.set_call_count(), 2);
}
