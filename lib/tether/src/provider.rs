//! The request provider.
//!
//! A [`Provider`] owns a base URL, a [`Transport`] and two ordered lists:
//! modifiers, applied to the [`RequestBuilder`] before it is finalized, and
//! interceptors, wrapped around the transport call. It offers two entry
//! points with identical ordering and error behavior:
//!
//! - [`Provider::request`] - suspending, returns the result
//! - [`Provider::request_with`] - returns immediately, reports through a callback
//!
//! # Example
//!
//! ```no_run
//! use tether::{HyperClient, Method, Provider, Request, Next};
//!
//! # async fn run() -> tether::Result<()> {
//! let mut provider = Provider::new("https://api.example.com", HyperClient::new());
//! provider
//!     .modify_requests(|builder| {
//!         builder.header("Accept", "application/json");
//!         Ok(())
//!     })
//!     .intercept(|request: Request, next: Next| async move {
//!         next.run(request.with_header("X-Request-Id", "42")).await
//!     });
//!
//! let mut builder = provider.new_builder(Method::Get, "/users/{id}");
//! builder.parameter("id", 7);
//! let response = provider.request(&mut builder).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tether_core::{
    Completion, Error, Interceptor, Method, Modifier, Next, Request, RequestBuilder, Response,
    Result, Transport, interceptor_fn, modifier_fn,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::chain;

/// Orchestrates modifiers, interceptors and the transport for every call.
///
/// Registration takes `&mut self` and calls take `&self`, so a provider
/// shared behind an [`Arc`] is frozen for as long as it is shared.
pub struct Provider<T> {
    base_url: String,
    transport: Arc<T>,
    runtime: Option<Handle>,
    modifiers: Vec<Box<dyn Modifier>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl<T> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("base_url", &self.base_url)
            .field("modifiers", &self.modifiers.len())
            .field("interceptors", &self.interceptors.len())
            .field("runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Provider<T> {
    /// Create a provider with no modifiers and no interceptors.
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self::with_shared(base_url, Arc::new(transport))
    }

    /// Create a provider over a transport shared with other providers.
    pub fn with_shared(base_url: impl Into<String>, transport: Arc<T>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            runtime: None,
            modifiers: Vec::new(),
            interceptors: Vec::new(),
        }
    }

    /// Run callback-style work on `runtime` instead of the caller's current one.
    ///
    /// Needed when [`Provider::request_with`] is called from threads outside
    /// any tokio runtime.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The base URL every builder starts from.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// A fresh builder seeded with the base URL, `method` and `path`.
    #[must_use]
    pub fn new_builder(&self, method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.base_url.as_str(), method, path)
    }

    /// Append a modifier. Modifiers run in registration order.
    pub fn add_modifier(&mut self, modifier: impl Modifier) -> &mut Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    /// Append a closure modifier.
    pub fn modify_requests<F>(&mut self, modifier: F) -> &mut Self
    where
        F: Fn(&mut RequestBuilder) -> Result<()> + Send + Sync + 'static,
    {
        self.add_modifier(modifier_fn(modifier))
    }

    /// Append an interceptor. The first registered one is outermost.
    pub fn add_interceptor(&mut self, interceptor: impl Interceptor) -> &mut Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append a closure interceptor.
    pub fn intercept<F, Fut>(&mut self, interceptor: F) -> &mut Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        self.add_interceptor(interceptor_fn(interceptor))
    }

    /// Consuming variant of [`Provider::add_modifier`].
    #[must_use]
    pub fn with_modifier(mut self, modifier: impl Modifier) -> Self {
        self.add_modifier(modifier);
        self
    }

    /// Consuming variant of [`Provider::add_interceptor`].
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.add_interceptor(interceptor);
        self
    }

    /// Apply every modifier, finalize the builder and build the request.
    ///
    /// The first failing modifier aborts: later modifiers do not run and
    /// the builder is not finalized.
    pub fn create_request(&self, builder: &mut RequestBuilder) -> Result<Request> {
        for modifier in &self.modifiers {
            modifier.modify(builder)?;
        }

        let url = builder.full_url()?;
        let (body, headers) = builder.body_and_headers()?;
        debug!(
            method = %builder.method(),
            url = %url,
            modifiers = self.modifiers.len(),
            "request assembled"
        );

        Ok(self.transport.build(builder.method(), url, headers, body))
    }

    /// Assemble the request, run it through the interceptors and the
    /// transport, and return the result.
    pub async fn request(&self, builder: &mut RequestBuilder) -> Result<Response> {
        let request = self.create_request(builder)?;
        let chain = chain::compose(&self.transport, &self.interceptors);

        debug!(interceptors = self.interceptors.len(), "invoking chain");
        chain.run(request).await
    }

    /// Callback variant of [`Provider::request`].
    ///
    /// Returns immediately. `on_complete` is invoked exactly once, with
    /// the same result [`Provider::request`] would have produced. Assembly
    /// failures are reported before this method returns.
    ///
    /// Interceptors run as tasks on the configured runtime (see
    /// [`Provider::with_runtime`]) or else on the caller's current one. With
    /// interceptors registered and no runtime at hand, the call fails with
    /// [`Error::NoRuntime`].
    pub fn request_with<F>(&self, builder: &mut RequestBuilder, on_complete: F)
    where
        F: FnOnce(Result<Response>) + Send + 'static,
    {
        let method = builder.method();
        let path = builder.path().to_owned();
        let completion = Completion::new(move |result: Result<Response>| {
            if let Err(error) = &result {
                warn!(%method, %path, %error, "request failed");
            }
            on_complete(result);
        });

        let request = match self.create_request(builder) {
            Ok(request) => request,
            Err(error) => {
                completion.complete(Err(error));
                return;
            }
        };

        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        if self.interceptors.is_empty() {
            let _entered = runtime.as_ref().map(Handle::enter);
            self.transport.execute_with(request, completion);
            return;
        }

        let Some(runtime) = runtime else {
            completion.complete(Err(Error::NoRuntime));
            return;
        };

        debug!(interceptors = self.interceptors.len(), "invoking callback chain");
        let chain = chain::compose_callback(&self.transport, &self.interceptors, &runtime);
        let _entered = runtime.enter();
        chain(request, completion);
    }
}
