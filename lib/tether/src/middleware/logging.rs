//! Request/response logging through `tracing`.

use std::time::Instant;

use futures_util::future::BoxFuture;
use tether_core::{Interceptor, Next, Request, Response, Result};
use tracing::{Instrument, Level, debug, info, span, warn};

/// How much detail [`Logging`] records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Request and response headers at debug level.
    Debug,
    /// One line per request and per outcome.
    #[default]
    Info,
}

/// Logs every call inside an `http_request` span.
///
/// Register it first to time the whole chain, last to time the transport
/// alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging {
    level: LogLevel,
}

impl Logging {
    /// Summary logging at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detailed logging at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// The configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl Interceptor for Logging {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url);

        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(headers = ?request.headers(), "sending request");
                    }
                    LogLevel::Info => info!("sending request"),
                }

                let result = next.run(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        let status = response.status();
                        match level {
                            LogLevel::Debug => {
                                debug!(
                                    status,
                                    elapsed_ms,
                                    headers = ?response.headers(),
                                    "request completed"
                                );
                            }
                            LogLevel::Info => info!(status, elapsed_ms, "request completed"),
                        }
                    }
                    Ok(response) => {
                        let status = response.status();
                        warn!(status, elapsed_ms, "request failed with HTTP error");
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
