//! Transport trait and the single-shot completion handle.
//!
//! A [`Transport`] performs the network exchange in two styles:
//! - [`Transport::execute`] - suspending, returns a future
//! - [`Transport::execute_with`] - callback based, reports through a [`Completion`]
//!
//! Implement both for custom transports or test doubles.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use url::Url;

use crate::{Error, Headers, Method, Request, Response, Result};

/// Performs the actual HTTP exchange.
///
/// Shared by every in-flight call of a provider, so implementations must be
/// safe to invoke concurrently.
///
/// # Example
///
/// ```
/// use std::future::Future;
///
/// use tether_core::{Completion, Headers, Request, Response, Result, Transport};
///
/// /// Answers every request with `200 OK` and the request body.
/// struct Echo;
///
/// impl Transport for Echo {
///     fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
///         async move {
///             let (_, _, headers, body) = request.into_parts();
///             Ok(Response::new(200, headers, body.unwrap_or_default()))
///         }
///     }
///
///     fn execute_with(&self, request: Request, completion: Completion) {
///         let (_, _, headers, body) = request.into_parts();
///         completion.complete(Ok(Response::new(200, headers, body.unwrap_or_default())));
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Build a [`Request`] from finalized parts.
    fn build(&self, method: Method, url: Url, headers: Headers, body: Option<Bytes>) -> Request {
        Request::from_parts(method, url, headers, body)
    }

    /// Execute a request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;

    /// Execute a request and report the result through `completion`.
    ///
    /// Must not block the calling thread on network I/O.
    fn execute_with(&self, request: Request, completion: Completion);
}

type Callback = Box<dyn FnOnce(Result<Response>) + Send + 'static>;

/// Single-use handle delivering the result of a callback-style call.
///
/// [`Completion::complete`] consumes the handle, so a result is delivered at
/// most once. A handle dropped without being completed delivers
/// [`Error::Abandoned`], so the callback also runs at least once.
pub struct Completion {
    callback: Option<Callback>,
}

impl Completion {
    /// Wrap a callback.
    pub fn new(callback: impl FnOnce(Result<Response>) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Deliver the result.
    pub fn complete(mut self, result: Result<Response>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(Error::Abandoned));
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}
