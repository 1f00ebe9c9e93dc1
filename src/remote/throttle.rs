//! Client-side request throttling for remote backends.

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;

use super::client::RateLimitConfig;

/// Token bucket every request to a backend passes through. A zero rate
/// falls back to one request per second; a zero burst to the rate.
pub struct RequestThrottle {
    limiter: DefaultDirectRateLimiter,
    clock: DefaultClock,
}

impl RequestThrottle {
    pub fn new(config: RateLimitConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(rate);
        Self {
            limiter: DefaultDirectRateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
            clock: DefaultClock::default(),
        }
    }

    /// Sleeps until the bucket has a token, then takes it.
    pub async fn wait(&self) {
        while let Err(not_until) = self.limiter.check() {
            tokio::time::sleep(not_until.wait_time_from(self.clock.now())).await;
        }
    }

    pub fn try_take(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
