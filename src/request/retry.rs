//! Retry policy: which outcomes are transient, and the delay sequence (§4.7).

use std::time::Duration;

/// Statuses that are retried per §4.1: client-timeout, locked-resource,
/// too-many-requests, and the 5xx family excluding 501 (not-implemented,
/// never transient).
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 500 | 502 | 503 | 504)
}

/// Computes the delay before the next attempt: `Retry-After` wins when
/// present and larger than the configured base delay, clamped to a 60s
/// ceiling so a misbehaving server can't stall the process indefinitely.
pub fn delay_for(base: Duration, retry_after: Option<Duration>) -> Duration {
    const CEILING: Duration = Duration::from_secs(60);
    let chosen = match retry_after {
        Some(ra) if ra > base => ra,
        _ => base,
    };
    chosen.min(CEILING)
}

/// Parses a `Retry-After` header value: either an integer seconds count
/// or an HTTP-date. Only the seconds form is currently supported; an
/// HTTP-date value is ignored (returns `None`) rather than guessed at.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
