//! Rate limiting utilities for GitHub API.
//!
//! GitHub signals rate limits either with a `Retry-After` header or with an
//! exhausted `X-RateLimit-Remaining` counter plus its reset time. Both are
//! turned into a single "seconds to wait" hint on the response, which the
//! client honours before repeating the request.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Pause after each successful mutating call in slow mode.
pub const SLOW_MODE_DELAY: Duration = Duration::from_secs(1);

/// Rate limit headers of one response.
#[derive(Debug, Clone, Default)]
pub struct RateLimitHeaders<'a> {
    /// `Retry-After`, in seconds.
    pub retry_after: Option<&'a str>,
    /// `X-RateLimit-Remaining`.
    pub remaining: Option<&'a str>,
    /// `X-RateLimit-Reset`, as a unix timestamp.
    pub reset: Option<&'a str>,
}

impl RateLimitHeaders<'_> {
    /// Seconds to wait before repeating the request, if the response asks
    /// for it.
    ///
    /// An explicit `Retry-After` wins. Otherwise an exhausted counter waits
    /// until its reset time, at least one second.
    #[must_use]
    pub fn wait_hint(&self, now: u64) -> Option<u64> {
        if let Some(secs) = self.retry_after.and_then(|v| v.trim().parse::<u64>().ok()) {
            return Some(secs);
        }

        let remaining = self.remaining?.trim().parse::<u64>().ok()?;
        if remaining > 0 {
            return None;
        }

        let reset = self.reset?.trim().parse::<u64>().ok()?;
        Some(reset.saturating_sub(now).max(1))
    }
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Waits the number of seconds GitHub asked for.
///
/// There is no upper bound: the request cannot succeed before the limit
/// resets.
pub async fn wait_for_retry_after(retry_after_secs: u64) {
    info!(retry_after = retry_after_secs, "Rate limited, waiting");
    tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
}

/// Slow-mode pause between mutating calls.
pub async fn throttle(delay: Duration) {
    debug!(delay_ms = delay.as_millis() as u64, "Slow mode, pausing");
    tokio::time::sleep(delay).await;
}
