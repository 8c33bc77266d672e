//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tether_core::prelude::*;
//! ```

pub use crate::{
    BoxFuture, Completion, ContentType, DefaultHeaders, Error, Headers, Interceptor, Method,
    Modifier, Multipart, Next, Part, Request, RequestBuilder, Response, Result, Transport,
    interceptor_fn, modifier_fn,
};
