//! Proactive request pacing.
//!
//! Pacing spreads requests out so a long run stays under the tracker's rate
//! limit. It never retries: a throttled response still surfaces as an error.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default pacing per tracker (requests per second).
pub mod rate_limits {
    /// GitHub: 5000 requests/hour for a token, 10/sec still allows bursts.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
    /// Taiga's hosted API throttles aggressively on writes.
    pub const TAIGA_DEFAULT_RPS: u32 = 5;
}

/// A shared API rate limiter using the governor crate.
///
/// Clones share the same budget, so one limiter can pace every client that
/// talks to the same host.
///
/// # Example
///
/// ```ignore
/// use storysync::rate_limit::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(5);
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
    rps: u32,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A value of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
            rps: rps.get(),
        }
    }

    /// Build a limiter from a configured rate, where 0 disables pacing.
    pub fn from_config(requests_per_second: u32) -> Option<Self> {
        (requests_per_second > 0).then(|| Self::new(requests_per_second))
    }

    /// Configured requests per second.
    pub fn rps(&self) -> u32 {
        self.rps
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter")
            .field("rps", &self.rps)
            .finish()
    }
}
