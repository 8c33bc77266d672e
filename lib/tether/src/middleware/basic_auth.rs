//! HTTP basic authentication.

use base64::Engine;
use futures_util::future::BoxFuture;
use tether_core::{Interceptor, Next, Request, Response, Result};

/// Sets `Authorization: Basic <base64(user:pass)>` on every request.
#[derive(Clone)]
pub struct BasicAuth {
    value: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}

impl BasicAuth {
    /// Encode the credentials once, up front.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            value: format!("Basic {encoded}"),
        }
    }
}

impl Interceptor for BasicAuth {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let request = request
            .without_header("Authorization")
            .with_header("Authorization", self.value.as_str());
        next.run(request)
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn encodes_credentials() {
        // "user:pass" -> "dXNlcjpwYXNz"
        check!(BasicAuth::new("user", "pass").value == "Basic dXNlcjpwYXNz");
    }
}
