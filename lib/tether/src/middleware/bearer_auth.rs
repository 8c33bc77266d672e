//! Bearer token authentication.

use futures_util::future::BoxFuture;
use tether_core::{Interceptor, Next, Request, Response, Result};

/// Sets `Authorization: Bearer <token>` on every request, replacing any
/// authorization header already present.
#[derive(Clone)]
pub struct BearerAuth {
    value: String,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

impl BearerAuth {
    /// Authenticate with `token`.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            value: format!("Bearer {}", token.as_ref()),
        }
    }
}

impl Interceptor for BearerAuth {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let request = request
            .without_header("Authorization")
            .with_header("Authorization", self.value.as_str());
        next.run(request)
    }
}
