//! Programmable HTTP request pipeline.
//!
//! A [`Provider`] turns a [`RequestBuilder`] into a [`Response`] in three
//! stages:
//!
//! 1. [`Modifier`]s mutate the builder, in registration order
//! 2. the builder is finalized into an immutable [`Request`]
//! 3. the request runs through the [`Interceptor`] chain down to the
//!    [`Transport`]
//!
//! Interceptors wrap the rest of the chain: the first registered one sees
//! the original request first and the final response last. They may rewrite
//! the request or the response, short-circuit, or call the rest of the chain
//! several times.
//!
//! Every call can be made in two styles with the same ordering and errors:
//! awaiting [`Provider::request`], or passing a callback to
//! [`Provider::request_with`].
//!
//! # Example
//!
//! ```no_run
//! use tether::middleware::{Logging, Retry};
//! use tether::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn run() -> tether::Result<()> {
//! let mut provider = Provider::new("https://api.example.com", HyperClient::new())
//!     .with_interceptor(Logging::new())
//!     .with_interceptor(Retry::new(2));
//! provider.modify_requests(|builder| {
//!     builder.header("Accept", "application/json");
//!     Ok(())
//! });
//!
//! let mut builder = provider.new_builder(Method::Get, "/users/{id}");
//! builder.parameter("id", 42);
//! let user: User = provider.request(&mut builder).await?.error_for_status()?.json()?;
//! # let _ = user;
//! # Ok(())
//! # }
//! ```

mod chain;
mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod provider;
mod service;

pub use client::{HyperClient, HyperClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use provider::Provider;
pub use service::ServiceTransport;

// Tower, for composing services in front of `ServiceTransport`
pub use tower;

pub use tether_core::{
    BoxError, BoxFuture, Completion, ContentType, DefaultHeaders, Error, FnInterceptor,
    FnModifier, Headers, Interceptor, Method, Modifier, Multipart, Next, Part, Request,
    RequestBuilder, Response, Result, StatusCode, Transport, from_json, interceptor_fn,
    modifier_fn, to_form, to_json, to_query_pairs,
};
