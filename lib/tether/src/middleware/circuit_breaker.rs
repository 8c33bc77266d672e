//! Circuit breaker.
//!
//! After `failure_threshold` consecutive failures the circuit opens and
//! calls fail fast with [`Error::CircuitOpen`] without reaching the rest of
//! the chain. Once `open_duration` has passed the circuit turns half-open:
//! calls go through again, `success_threshold` consecutive successes close
//! it and any failure opens it again.
//!
//! Connection errors, timeouts and 5xx responses count as failures.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tether_core::{Error, Interceptor, Next, Request, Response, Result};
use tokio::time::Instant;
use tracing::{info, warn};

/// State of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected.
    Open,
    /// Trial calls decide whether to close or reopen.
    HalfOpen,
}

/// Thresholds of a [`CircuitBreaker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open a closed circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open.
    pub open_duration: Duration,
    /// Consecutive half-open successes that close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Set the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the open duration.
    #[must_use]
    pub const fn with_open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    /// Set the success threshold.
    #[must_use]
    pub const fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

impl Breaker {
    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.successes = 0;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.failures = 0;
        self.successes = 0;
    }
}

/// Fails fast while a downstream service keeps failing.
///
/// Clones share the same circuit.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    breaker: Arc<Mutex<Breaker>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    /// Closed circuit with the given thresholds.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breaker: Arc::new(Mutex::new(Breaker {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            })),
        }
    }

    /// Current state, as seen by the next call.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut breaker = self.lock();
        self.refresh(&mut breaker);
        breaker.state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Breaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move an open circuit to half-open once the open duration elapsed.
    fn refresh(&self, breaker: &mut Breaker) {
        if breaker.state == CircuitState::Open
            && breaker
                .opened_at
                .is_some_and(|opened| opened.elapsed() >= self.config.open_duration)
        {
            breaker.state = CircuitState::HalfOpen;
            breaker.successes = 0;
        }
    }

    fn permit(&self) -> bool {
        let mut breaker = self.lock();
        self.refresh(&mut breaker);
        breaker.state != CircuitState::Open
    }

    fn record(&self, failed: bool) {
        let mut breaker = self.lock();
        match (breaker.state, failed) {
            (CircuitState::Closed, false) => breaker.failures = 0,
            (CircuitState::Closed, true) => {
                breaker.failures += 1;
                if breaker.failures >= self.config.failure_threshold {
                    warn!(failures = breaker.failures, "circuit opened");
                    breaker.open();
                }
            }
            (CircuitState::HalfOpen, false) => {
                breaker.successes += 1;
                if breaker.successes >= self.config.success_threshold {
                    info!("circuit closed");
                    breaker.close();
                }
            }
            (CircuitState::HalfOpen, true) => {
                warn!("trial call failed, circuit reopened");
                breaker.open();
            }
            (CircuitState::Open, _) => {}
        }
    }

    fn is_failure(result: &Result<Response>) -> bool {
        match result {
            Ok(response) => response.is_server_error(),
            Err(error) => error.is_transient(),
        }
    }
}

impl Interceptor for CircuitBreaker {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            if !self.permit() {
                return Err(Error::CircuitOpen);
            }

            let result = next.run(request).await;
            self.record(Self::is_failure(&result));
            result
        })
    }
}
