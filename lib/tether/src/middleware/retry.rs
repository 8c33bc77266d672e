//! Retrying failed calls.
//!
//! The [`Retry`] interceptor re-runs the rest of the chain for transient
//! failures:
//! - connection errors and timeouts
//! - 5xx server errors
//! - 429 Too Many Requests
//!
//! Other outcomes, including 4xx responses and build-time errors, are
//! returned as-is.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tether_core::{Error, Interceptor, Next, Request, Response, Result};
use tracing::debug;

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,
    /// Wait the same delay before every retry.
    Fixed(Duration),
    /// Double the delay after every retry, starting at `initial`, never
    /// exceeding `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Upper bound for any delay.
        max: Duration,
    },
}

impl Backoff {
    /// Delay before retry number `retry` (zero based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Re-runs `next` for transient failures, up to `max_retries` extra times.
///
/// ```
/// use std::time::Duration;
///
/// use tether::middleware::{Backoff, Retry};
///
/// let retry = Retry::new(3).with_backoff(Backoff::Exponential {
///     initial: Duration::from_millis(100),
///     max: Duration::from_secs(2),
/// });
/// # let _ = retry;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    max_retries: u32,
    backoff: Backoff,
}

impl Retry {
    /// Retry up to `max_retries` times without delay.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    /// Wait according to `backoff` before each retry.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    fn should_retry_response(response: &Response) -> bool {
        let status = response.status();
        status >= 500 || status == 429
    }

    fn should_retry_error(error: &Error) -> bool {
        error.is_transient()
    }

    fn should_retry(result: &Result<Response>) -> bool {
        match result {
            Ok(response) => Self::should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        }
    }
}

impl Interceptor for Retry {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            let mut retries = 0;
            loop {
                let result = next.run(request.clone()).await;
                if retries >= self.max_retries || !Self::should_retry(&result) {
                    return result;
                }

                let delay = self.backoff.delay(retries);
                retries += 1;
                debug!(
                    retry = retries,
                    max_retries = self.max_retries,
                    ?delay,
                    "retrying request"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        })
    }
}
