//! Ready-made interceptors.
//!
//! Every type here implements [`Interceptor`](tether_core::Interceptor) and
//! registers like any other, through [`Provider::add_interceptor`] or
//! [`Provider::with_interceptor`]. The first registered interceptor is the
//! outermost one: register [`Logging`] first to log what the caller sees,
//! after [`Retry`] to log every attempt.
//!
//! # Feature Flags
//!
//! | Feature | Interceptor |
//! |---------|-------------|
//! | `middleware-basic-auth` | `BasicAuth` |
//! | `middleware-decompression` | `Decompression` |
//! | `middleware-rate-limit` | `RateLimit` |
//! | `middleware-circuit-breaker` | `CircuitBreaker` |
//! | `middleware-metrics` | `Metrics` |
//! | `middleware-core` | basic auth + decompression |
//! | `middleware-resilience` | rate limit + circuit breaker |
//! | `middleware-full` | all of the above |
//!
//! [`Logging`], [`BearerAuth`], [`Retry`] and [`FollowRedirects`] are
//! always available.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use tether::middleware::{Backoff, BearerAuth, FollowRedirects, Logging, Retry};
//! use tether::{HyperClient, Provider};
//!
//! let provider = Provider::new("https://api.example.com", HyperClient::new())
//!     .with_interceptor(Logging::new())
//!     .with_interceptor(BearerAuth::new("my-token"))
//!     .with_interceptor(FollowRedirects::new())
//!     .with_interceptor(Retry::new(3).with_backoff(Backoff::Fixed(Duration::from_millis(200))));
//! # let _ = provider;
//! ```
//!
//! [`Provider::add_interceptor`]: crate::Provider::add_interceptor
//! [`Provider::with_interceptor`]: crate::Provider::with_interceptor

#[cfg(feature = "middleware-basic-auth")]
mod basic_auth;
mod bearer_auth;
#[cfg(feature = "middleware-circuit-breaker")]
mod circuit_breaker;
#[cfg(feature = "middleware-decompression")]
mod decompression;
mod follow_redirect;
mod logging;
#[cfg(feature = "middleware-metrics")]
mod metrics;
#[cfg(feature = "middleware-rate-limit")]
mod rate_limit;
mod retry;

#[cfg(feature = "middleware-basic-auth")]
pub use basic_auth::BasicAuth;
pub use bearer_auth::BearerAuth;
#[cfg(feature = "middleware-circuit-breaker")]
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
#[cfg(feature = "middleware-decompression")]
pub use decompression::Decompression;
pub use follow_redirect::{DEFAULT_MAX_REDIRECTS, FollowRedirects};
pub use logging::{LogLevel, Logging};
#[cfg(feature = "middleware-metrics")]
pub use metrics::Metrics;
#[cfg(feature = "middleware-rate-limit")]
pub use rate_limit::RateLimit;
pub use retry::{Backoff, Retry};
pub use tether_core::DefaultHeaders;
