//! Tower services as transports.

use std::sync::{Mutex, PoisonError};

use tether_core::{BoxError, Completion, Error, Request, Response, Result, Transport};
use tokio::runtime::Handle;
use tower::ServiceExt;
use tower_service::Service;

/// Adapts a [`tower::Service`] into a [`Transport`].
///
/// Each call clones the service, waits for readiness and then calls it, so
/// tower layers such as concurrency limits or timeouts can sit between the
/// interceptor chain and the network.
///
/// Service errors that already are an [`Error`] pass through unchanged;
/// anything else becomes [`Error::Other`].
///
/// ```no_run
/// use tether::tower::ServiceBuilder;
/// use tether::{HyperClient, Provider, ServiceTransport};
///
/// let service = ServiceBuilder::new()
///     .concurrency_limit(16)
///     .service(HyperClient::new());
/// let provider = Provider::new("https://api.example.com", ServiceTransport::new(service));
/// # let _ = provider;
/// ```
#[derive(Debug)]
pub struct ServiceTransport<S> {
    service: Mutex<S>,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }

    /// Take the wrapped service back.
    pub fn into_inner(self) -> S {
        self.service
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Clone> ServiceTransport<S> {
    fn service(&self) -> S {
        self.service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    async fn execute(&self, request: Request) -> Result<Response> {
        let service = self.service();
        service.oneshot(request).await.map_err(into_error)
    }

    fn execute_with(&self, request: Request, completion: Completion) {
        let Ok(runtime) = Handle::try_current() else {
            completion.complete(Err(Error::NoRuntime));
            return;
        };

        let service = self.service();
        runtime.spawn(async move {
            completion.complete(service.oneshot(request).await.map_err(into_error));
        });
    }
}

fn into_error(error: impl Into<BoxError>) -> Error {
    match error.into().downcast::<Error>() {
        Ok(error) => *error,
        Err(other) => Error::Other(other),
    }
}
