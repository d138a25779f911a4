//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Relay frames accepted per second from a single hardware connection
pub const RELAY_RATE_LIMIT: u32 = 200;

/// Per-connection ingest limiter for relay frames
#[derive(Clone)]
pub struct IngestRateLimiter {
    frame_limiter: Arc<Limiter>,
}

impl IngestRateLimiter {
    pub fn new(frames_per_second: u32) -> Self {
        Self {
            frame_limiter: create_limiter(frames_per_second),
        }
    }

    /// Check if another frame is allowed (returns true if allowed)
    pub fn check_frame(&self) -> bool {
        self.frame_limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_beyond_quota_is_rejected() {
        let limiter = IngestRateLimiter::new(3);
        assert!(limiter.check_frame());
        assert!(limiter.check_frame());
        assert!(limiter.check_frame());
        assert!(!limiter.check_frame());
    }

    #[test]
    fn zero_quota_falls_back_to_one() {
        let limiter = IngestRateLimiter::new(0);
        assert!(limiter.check_frame());
        assert!(!limiter.check_frame());
    }
}
