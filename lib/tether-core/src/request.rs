//! Finalized HTTP requests.
//!
//! A [`Request`] is produced once per call, after modifiers ran and the
//! [`RequestBuilder`](crate::RequestBuilder) was finalized. It is never
//! mutated afterwards: interceptors that rewrite a request consume it and
//! hand a new value to the next step.
//!
//! # Example
//!
//! ```
//! use tether_core::{Headers, Method, Request};
//!
//! let url = "https://api.example.com/users".parse().expect("valid URL");
//! let request = Request::from_parts(Method::Get, url, Headers::new(), None)
//!     .with_header("Accept", "application/json");
//!
//! assert_eq!(request.header("Accept"), Some("application/json"));
//! ```

use bytes::Bytes;
use url::Url;

use crate::{Headers, Method};

/// An HTTP request with method, absolute URL, headers, and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
}

impl Request {
    /// Assembles a request from its finalized parts.
    #[must_use]
    pub fn from_parts(method: Method, url: Url, headers: Headers, body: Option<Bytes>) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Headers, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }

    /// Returns a new request with the header set.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a new request without the header, matched ignoring ASCII case.
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove_ignore_case(name);
        self
    }

    /// Returns a new request targeting another URL, keeping everything else.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    fn sample() -> Request {
        let url = Url::parse("https://api.example.com/users").expect("valid URL");
        Request::from_parts(
            Method::Post,
            url,
            [("Accept", "application/json")].into_iter().collect(),
            Some(Bytes::from_static(b"{}")),
        )
    }

    #[test]
    fn request_accessors() {
        let request = sample();

        check!(request.method() == Method::Post);
        check!(request.url().as_str() == "https://api.example.com/users");
        check!(request.header("Accept") == Some("application/json"));
        check!(request.body() == Some(&Bytes::from_static(b"{}")));
    }

    #[test]
    fn request_rewrites_produce_new_values() {
        let original = sample();
        let rewritten = original
            .clone()
            .with_header("X-Trace", "abc")
            .without_header("Accept");

        check!(original.header("Accept") == Some("application/json"));
        check!(original.header("X-Trace").is_none());
        check!(rewritten.header("Accept").is_none());
        check!(rewritten.header("X-Trace") == Some("abc"));
    }

    #[test]
    fn request_into_parts_round_trips() {
        let request = sample();
        let (method, url, headers, body) = request.clone().into_parts();
        check!(Request::from_parts(method, url, headers, body) == request);
    }
}
