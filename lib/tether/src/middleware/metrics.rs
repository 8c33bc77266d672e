//! HTTP client metrics through the `metrics` facade.
//!
//! Recorded metrics:
//! - `http_client_requests_total` counter, labeled by `method` and `status`
//!   (`"error"` when no response was received)
//! - `http_client_request_duration_seconds` histogram, labeled by `method`
//! - `http_client_requests_in_flight` gauge
//!
//! Nothing is exported unless the application installs a recorder.

use std::time::Instant;

use futures_util::future::BoxFuture;
use tether_core::{Interceptor, Next, Request, Response, Result};

const LABEL_METHOD: &str = "method";
const LABEL_STATUS: &str = "status";

const METRIC_REQUESTS_TOTAL: &str = "http_client_requests_total";
const METRIC_REQUEST_DURATION: &str = "http_client_request_duration_seconds";
const METRIC_REQUESTS_IN_FLIGHT: &str = "http_client_requests_in_flight";

/// Records request count, latency and concurrency.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics;

impl Metrics {
    /// Record into the globally installed recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Keeps the in-flight gauge right when a call is dropped midway.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}

impl Interceptor for Metrics {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let method = request.method().as_str();

        Box::pin(async move {
            let in_flight = InFlight::enter();
            let start = Instant::now();
            let result = next.run(request).await;
            drop(in_flight);

            metrics::histogram!(METRIC_REQUEST_DURATION, LABEL_METHOD => method)
                .record(start.elapsed().as_secs_f64());

            let status = match &result {
                Ok(response) => response.status().to_string(),
                Err(_) => "error".to_owned(),
            };
            metrics::counter!(
                METRIC_REQUESTS_TOTAL,
                LABEL_METHOD => method,
                LABEL_STATUS => status
            )
            .increment(1);

            result
        })
    }
}
