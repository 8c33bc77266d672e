//! Client-side rate limiting with governor.

use std::num::NonZeroU32;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use governor::{Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::NotKeyed};
use tether_core::{Interceptor, Next, Request, Response, Result};

type GovernorLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Delays calls so they never exceed a token-bucket quota.
///
/// Clones share the same bucket, as do all calls through one provider.
///
/// ```
/// use std::num::NonZeroU32;
///
/// use tether::middleware::RateLimit;
///
/// let limit = RateLimit::per_second(NonZeroU32::new(10).expect("non-zero"));
/// # let _ = limit;
/// ```
#[derive(Debug, Clone)]
pub struct RateLimit {
    limiter: Arc<GovernorLimiter>,
}

impl RateLimit {
    /// At most `count` calls per second, bursting up to `count`.
    #[must_use]
    pub fn per_second(count: NonZeroU32) -> Self {
        Self::with_quota(Quota::per_second(count))
    }

    /// At most `count` calls per minute, bursting up to `count`.
    #[must_use]
    pub fn per_minute(count: NonZeroU32) -> Self {
        Self::with_quota(Quota::per_minute(count))
    }

    /// Custom governor quota.
    #[must_use]
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl Interceptor for RateLimit {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            self.limiter.until_ready().await;
            next.run(request).await
        })
    }
}
