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

/// Create a rate limiter with the specified messages per second
pub fn create_limiter(messages_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(messages_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Renderer messages are far more frequent than feed snapshots
pub const RENDER_RATE_LIMIT: u32 = 120;

/// Per-socket rate limiter for inbound bridge frames
#[derive(Clone)]
pub struct BridgeRateLimiter {
    limiter: Arc<Limiter>,
}

impl BridgeRateLimiter {
    pub fn new(messages_per_second: u32) -> Self {
        Self {
            limiter: create_limiter(messages_per_second),
        }
    }

    /// Check if an inbound frame is allowed (returns true if allowed)
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_beyond_quota_is_rejected() {
        let limiter = BridgeRateLimiter::new(3);
        let allowed = (0..10).filter(|_| limiter.check()).count();
        assert_eq!(allowed, 3);
    }

    #[test]
    fn zero_quota_still_allows_one() {
        let limiter = BridgeRateLimiter::new(0);
        assert!(limiter.check());
    }
}
