use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::error::NrcError;

/// Per-username login attempt limiter.
#[derive(Clone)]
pub struct LoginThrottle {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl LoginThrottle {
    pub fn per_minute(attempts: u32) -> Self {
        let attempts = NonZeroU32::new(attempts.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(attempts))),
        }
    }

    pub fn check(&self, username: &str) -> Result<(), NrcError> {
        let key = username.trim().to_lowercase();
        if self.limiter.check_key(&key).is_err() {
            warn!(username = %key, "login attempts throttled");
            return Err(NrcError::RateLimited);
        }
        Ok(())
    }
}
