//! Rate-limit aware request pacing.
//!
//! The monitor reads the remaining request budget and the reset time from
//! each API response and, before the next request, pauses until the budget
//! resets when it has dropped to the configured threshold. It is advisory:
//! it never refuses a request, it only delays it.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Header carrying the remaining request budget.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the reset time as epoch seconds.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Pause once the remaining budget is at or below this value.
pub const DEFAULT_THRESHOLD: u64 = 10;

/// Margin added on top of the time left until reset.
const RESET_MARGIN: Duration = Duration::from_secs(1);

/// Last observed budget. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RateLimitState {
    remaining: Option<u64>,
    reset_at: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Reads both fields from response headers. Absent or malformed values
    /// become unknown.
    fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_str(headers, REMAINING_HEADER).and_then(parse_remaining),
            reset_at: header_str(headers, RESET_HEADER).and_then(parse_reset),
        }
    }

    /// How long to pause before the next request, if at all.
    fn pause_for(&self, threshold: u64, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.remaining?;
        if remaining > threshold {
            return None;
        }

        let until_reset = self
            .reset_at
            .and_then(|reset| (reset - now).to_std().ok())
            .unwrap_or(Duration::ZERO);

        Some(until_reset + RESET_MARGIN)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_remaining(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

fn parse_reset(value: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = (secs.fract() * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

/// Shared rate-limit monitor.
///
/// State reads, updates and pauses all go through one async mutex, so
/// concurrent repository tasks never race on the budget, and a pause holds
/// the lock so sibling requests queue behind it.
#[derive(Debug)]
pub struct RateLimitMonitor {
    threshold: u64,
    state: Mutex<RateLimitState>,
}

impl Default for RateLimitMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl RateLimitMonitor {
    /// Create a monitor that pauses at or below `threshold` remaining calls.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            state: Mutex::new(RateLimitState::default()),
        }
    }

    /// Record the budget reported by a response.
    pub async fn update(&self, headers: &HeaderMap) {
        let observed = RateLimitState::from_headers(headers);
        debug!(
            "Rate limit: remaining={:?} reset_at={:?}",
            observed.remaining, observed.reset_at
        );
        *self.state.lock().await = observed;
    }

    /// Pause until the budget resets if it is running low.
    ///
    /// After a pause the remaining budget is unknown until the next response
    /// reports it, so callers queued behind the pause go straight through.
    pub async fn wait_if_needed(&self) {
        let mut state = self.state.lock().await;
        if let Some(delay) = state.pause_for(self.threshold, Utc::now()) {
            warn!(
                "Rate limit nearly exhausted ({} left), pausing for {}s",
                state.remaining.unwrap_or(0),
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
            state.remaining = None;
        }
    }

    /// Remaining budget as last reported, if known.
    pub async fn remaining(&self) -> Option<u64> {
        self.state.lock().await.remaining
    }

    /// Reset time as last reported, if known.
    pub async fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.reset_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(remaining: Option<&str>, reset: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = remaining {
            map.insert(REMAINING_HEADER, HeaderValue::from_str(value).unwrap());
        }
        if let Some(value) = reset {
            map.insert(RESET_HEADER, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn epoch_offset(secs: i64) -> String {
        (Utc::now().timestamp() + secs).to_string()
    }

    #[tokio::test]
    async fn test_update_sets_remaining_and_reset() {
        let monitor = RateLimitMonitor::default();
        monitor
            .update(&headers(Some("100"), Some(&epoch_offset(3600))))
            .await;
        assert_eq!(monitor.remaining().await, Some(100));
        assert!(monitor.reset_at().await.is_some());
    }

    #[tokio::test]
    async fn test_update_accepts_fractional_reset() {
        let monitor = RateLimitMonitor::default();
        monitor
            .update(&headers(Some("7"), Some("1700000000.25")))
            .await;
        let reset = monitor.reset_at().await.unwrap();
        assert_eq!(reset.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_update_without_headers_clears_state() {
        let monitor = RateLimitMonitor::default();
        monitor
            .update(&headers(Some("100"), Some(&epoch_offset(3600))))
            .await;
        monitor.update(&headers(None, None)).await;
        assert_eq!(monitor.remaining().await, None);
        assert_eq!(monitor.reset_at().await, None);
    }

    #[tokio::test]
    async fn test_update_tolerates_garbage() {
        let monitor = RateLimitMonitor::default();
        monitor
            .update(&headers(Some("lots"), Some("soon")))
            .await;
        assert_eq!(monitor.remaining().await, None);
        assert_eq!(monitor.reset_at().await, None);

        monitor.update(&headers(Some("-3"), Some("-10"))).await;
        assert_eq!(monitor.remaining().await, None);
        assert_eq!(monitor.reset_at().await, None);
    }

    #[test]
    fn test_pause_for_decisions() {
        let now = Utc::now();
        let unknown = RateLimitState::default();
        assert_eq!(unknown.pause_for(10, now), None);

        let plenty = RateLimitState {
            remaining: Some(50),
            reset_at: Some(now + chrono::Duration::seconds(3600)),
        };
        assert_eq!(plenty.pause_for(10, now), None);

        let low = RateLimitState {
            remaining: Some(10),
            reset_at: Some(now + chrono::Duration::seconds(30)),
        };
        assert_eq!(low.pause_for(10, now), Some(Duration::from_secs(31)));

        let past = RateLimitState {
            remaining: Some(5),
            reset_at: Some(now - chrono::Duration::seconds(120)),
        };
        assert_eq!(past.pause_for(10, now), Some(Duration::from_secs(1)));

        let no_reset = RateLimitState {
            remaining: Some(0),
            reset_at: None,
        };
        assert_eq!(no_reset.pause_for(10, now), Some(Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_if_needed_no_wait_when_above_threshold() {
        let monitor = RateLimitMonitor::new(10);
        monitor
            .update(&headers(Some("50"), Some(&epoch_offset(3600))))
            .await;

        let start = tokio::time::Instant::now();
        monitor.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_if_needed_no_wait_when_unknown() {
        let monitor = RateLimitMonitor::default();
        let start = tokio::time::Instant::now();
        monitor.wait_if_needed().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    async fn waited(monitor: &RateLimitMonitor, start: tokio::time::Instant) -> Duration {
        monitor.wait_if_needed().await;
        start.elapsed()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waits_share_one_pause() {
        let monitor = RateLimitMonitor::new(10);
        monitor
            .update(&headers(Some("2"), Some(&epoch_offset(30))))
            .await;

        let start = tokio::time::Instant::now();
        let (a, b, c) = tokio::join!(
            waited(&monitor, start),
            waited(&monitor, start),
            waited(&monitor, start),
        );

        assert!(a >= Duration::from_secs(30));
        assert!(a < Duration::from_secs(33));
        // Queued callers leave with the first one instead of pausing again
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(monitor.remaining().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_queues_behind_pause() {
        let monitor = RateLimitMonitor::new(10);
        monitor
            .update(&headers(Some("0"), Some(&epoch_offset(20))))
            .await;
        let fresh = headers(Some("5000"), Some(&epoch_offset(3600)));

        let start = tokio::time::Instant::now();
        let (paused, updated) = tokio::join!(waited(&monitor, start), async {
            tokio::task::yield_now().await;
            monitor.update(&fresh).await;
            start.elapsed()
        });

        assert!(paused >= Duration::from_secs(20));
        assert!(updated >= paused);
        assert_eq!(monitor.remaining().await, Some(5000));

        // The fresh budget is above the threshold
        let before = tokio::time::Instant::now();
        monitor.wait_if_needed().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_if_needed_past_reset_waits_margin_only() {
        let monitor = RateLimitMonitor::new(10);
        monitor
            .update(&headers(Some("5"), Some(&epoch_offset(-1))))
            .await;

        let start = tokio::time::Instant::now();
        monitor.wait_if_needed().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(2));
    }
}
