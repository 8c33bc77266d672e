//! Core types and traits for the tether HTTP request pipeline.
//!
//! This crate provides the foundational types used by tether:
//! - [`Method`], [`Headers`] - request vocabulary
//! - [`RequestBuilder`] - mutable accumulator resolved into a [`Request`]
//! - [`Request`] and [`Response`] - immutable call values
//! - [`Error`] and [`Result`] - error handling; `Result<Response>` is the
//!   tagged outcome every call produces exactly once
//! - [`Transport`] and [`Completion`] - the network collaborator contract
//! - [`Interceptor`], [`Next`] - middleware wrapping the rest of the chain
//! - [`Modifier`] - pre-finalization builder mutation
//! - [`Multipart`], [`Part`] - `multipart/form-data` bodies

mod body;
mod builder;
mod error;
mod headers;
mod interceptor;
mod method;
mod modifier;
mod multipart;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use body::{ContentType, from_json, to_form, to_json, to_query_pairs};
pub use builder::RequestBuilder;
pub use error::{BoxError, Error, Result};
pub use headers::Headers;
pub use interceptor::{FnInterceptor, Interceptor, Next, interceptor_fn};
pub use method::Method;
pub use modifier::{DefaultHeaders, FnModifier, Modifier, modifier_fn};
pub use multipart::{Multipart, Part};
pub use request::Request;
pub use response::Response;
pub use transport::{Completion, Transport};

// Re-export http crate types for status codes
pub use http::StatusCode;

/// Boxed, `Send` future returned by [`Interceptor::intercept`] and [`Next::run`].
pub use futures_util::future::BoxFuture;
