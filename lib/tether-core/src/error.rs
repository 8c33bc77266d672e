//! Error types for tether.
//!
//! A single [`Error`] covers every stage of a call: modifier failures,
//! builder finalization, transport failures and interceptor failures.

use derive_more::{Display, Error, From};

use crate::Response;

/// Boxed error raised by user code (modifiers, interceptors, transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for tether operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A 4xx or 5xx response turned into a failure by
    /// [`Response::error_for_status`].
    #[display("HTTP error {}: {}", _0.status(), _0.reason())]
    #[from(skip)]
    Status(#[error(not(source))] Box<Response>),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// A `{name}` placeholder in the path had no value.
    #[display("missing path parameter `{_0}`")]
    #[from(skip)]
    MissingParameter(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form or query string serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Too many redirects.
    #[display("too many redirects ({count} exceeded max of {max})")]
    #[from(skip)]
    TooManyRedirects {
        /// Number of redirects followed.
        count: usize,
        /// Maximum allowed redirects.
        max: usize,
    },

    /// Invalid redirect response.
    #[display("invalid redirect: {_0}")]
    #[from(skip)]
    InvalidRedirect(#[error(not(source))] String),

    /// Failure raised by an interceptor.
    #[display("interceptor error: {_0}")]
    #[from(skip)]
    Interceptor(#[error(not(source))] String),

    /// The circuit breaker rejected the call without reaching the transport.
    #[display("circuit breaker is open")]
    #[from(skip)]
    CircuitOpen,

    /// A completion was dropped before it delivered a result.
    #[display("call was abandoned before it completed")]
    #[from(skip)]
    Abandoned,

    /// No tokio runtime was available to schedule a callback-style call.
    #[display("no async runtime available to schedule the call")]
    #[from(skip)]
    NoRuntime,

    /// Any other error raised by user code.
    #[display("{_0}")]
    #[from(skip)]
    Other(#[error(not(source))] BoxError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an interceptor error.
    #[must_use]
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::Interceptor(message.into())
    }

    /// Wrap an arbitrary error.
    #[must_use]
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The exchange timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The connection failed or broke.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Failures worth another attempt: the exchange itself broke or timed
    /// out, as opposed to the request being wrong.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.is_connection() || self.is_timeout()
    }

    /// The failed response, for [`Error::Status`].
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Status(response) => Some(response.as_ref()),
            _ => None,
        }
    }

    /// The status code of the failed response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response().map(Response::status)
    }

    /// A failed 4xx response.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.response().is_some_and(Response::is_client_error)
    }

    /// A failed 5xx response.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.response().is_some_and(Response::is_server_error)
    }

    /// Body of the failed response.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        self.response().map(Response::body)
    }

    /// Decode the failed response body as JSON, typically an API error
    /// document.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.response().map(Response::json)
    }
}
