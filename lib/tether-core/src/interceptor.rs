//! Interceptors and the `Next` continuation.
//!
//! An [`Interceptor`] wraps the rest of the chain. It receives the finalized
//! [`Request`] and a [`Next`] handle and may:
//! - rewrite the request before calling `next`
//! - rewrite the response (or error) after `next` returns
//! - short-circuit by returning without calling `next`
//! - retry by calling `next` several times (`Next` is cheap to clone)
//!
//! Interceptors are written once, against the suspending contract, and run
//! unchanged under both the async and the callback entry points of a
//! provider.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::{Request, Response, Result};

type Step = dyn Fn(Request) -> BoxFuture<'static, Result<Response>> + Send + Sync;

/// Handle to the remainder of the chain.
#[derive(Clone)]
pub struct Next {
    step: Arc<Step>,
}

impl Next {
    /// Wrap a function as the next step of a chain.
    pub fn new<F, Fut>(step: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        Self {
            step: Arc::new(
                move |request: Request| -> BoxFuture<'static, Result<Response>> {
                    Box::pin(step(request))
                },
            ),
        }
    }

    /// Continue the chain with `request`.
    ///
    /// The returned future does not borrow `self`, so it can be awaited
    /// after the handle is moved or dropped.
    pub fn run(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        (self.step)(request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Middleware unit wrapping the call to the next step of the chain.
///
/// # Example
///
/// ```
/// use futures_util::future::BoxFuture;
/// use tether_core::{Interceptor, Next, Request, Response, Result};
///
/// /// Stamps every request with a fixed client name.
/// struct ClientName(&'static str);
///
/// impl Interceptor for ClientName {
///     fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
///         let request = request.with_header("X-Client", self.0);
///         Box::pin(async move { next.run(request).await })
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync + 'static {
    /// Handle `request`, delegating to `next` as many times as needed.
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>>;
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        (**self).intercept(request, next)
    }
}

impl<I: Interceptor + ?Sized> Interceptor for Box<I> {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        (**self).intercept(request, next)
    }
}

/// Interceptor built from a closure. See [`interceptor_fn`].
#[derive(Clone)]
pub struct FnInterceptor<F> {
    f: F,
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor").finish_non_exhaustive()
    }
}

impl<F, Fut> Interceptor for FnInterceptor<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        Box::pin((self.f)(request, next))
    }
}

/// Turn a closure into an [`Interceptor`].
///
/// ```
/// use tether_core::interceptor_fn;
///
/// let add_trace = interceptor_fn(|request: tether_core::Request, next: tether_core::Next| async move {
///     next.run(request.with_header("X-Trace", "1")).await
/// });
/// # let _ = add_trace;
/// ```
pub fn interceptor_fn<F, Fut>(f: F) -> FnInterceptor<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    FnInterceptor { f }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::{check, let_assert};
    use bytes::Bytes;

    use super::*;
    use crate::{Error, Headers, Method};

    fn request() -> Request {
        let url = url::Url::parse("https://example.com/").expect("url");
        Request::from_parts(Method::Get, url, Headers::new(), None)
    }

    fn echo_headers() -> Next {
        Next::new(|request: Request| async move {
            let (_, _, headers, _) = request.into_parts();
            Ok(Response::new(200, headers, Bytes::new()))
        })
    }

    #[tokio::test]
    async fn closure_interceptor_rewrites_request() {
        let interceptor = interceptor_fn(|request: Request, next: Next| async move {
            next.run(request.with_header("X-Trace", "1")).await
        });

        let response = interceptor
            .intercept(request(), echo_headers())
            .await
            .expect("response");
        check!(response.headers().get("X-Trace") == Some("1"));
    }

    #[tokio::test]
    async fn next_can_run_several_times() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let next = Next::new(move |_request: Request| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(Error::connection("reset"))
                } else {
                    Ok(Response::new(200, Headers::new(), Bytes::new()))
                }
            }
        });

        let retry_once = interceptor_fn(|request: Request, next: Next| async move {
            match next.run(request.clone()).await {
                Ok(response) => Ok(response),
                Err(_) => next.run(request).await,
            }
        });

        let_assert!(Ok(response) = retry_once.intercept(request(), next).await);
        check!(response.status() == 200);
        check!(calls.load(Ordering::SeqCst) == 2);
    }

    #[tokio::test]
    async fn shared_interceptor_delegates() {
        let shared: Arc<dyn Interceptor> = Arc::new(interceptor_fn(
            |_request: Request, _next: Next| async move { Err(Error::interceptor("denied")) },
        ));

        let_assert!(Err(Error::Interceptor(message)) = shared.intercept(request(), echo_headers()).await);
        check!(message == "denied");
    }
}
