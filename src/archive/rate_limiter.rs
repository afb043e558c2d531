use std::time::Duration;
use tracing::debug;

/// Gate invoked after every network request. The upstream service
/// blacklists clients that request too quickly.
pub trait RateLimiter {
    fn pause(&self);
}

/// Sleeps for a fixed interval after each request.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    delay: Duration,
}

impl FixedInterval {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

}

impl RateLimiter for FixedInterval {
    fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!("Sleeping {:?} before next request", self.delay);
        std::thread::sleep(self.delay);
    }
}

/// No-op gate for tests and local sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl RateLimiter for NoDelay {
    fn pause(&self) {}
}
