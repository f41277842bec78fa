use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters, initialized at 1.
static CLIENT_ID_COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));
static REQUEST_ID_COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));

/// Returns a process-unique identifier for an accepted connection.
#[inline]
pub fn next_client_id() -> String {
    format!("client-{}", CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Returns a process-unique request id for callers that do not pick their own.
#[inline]
pub fn next_request_id() -> String {
    format!("req-{}", REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}
