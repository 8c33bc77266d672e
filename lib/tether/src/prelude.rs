//! Common imports.
//!
//! ```
//! use tether::prelude::*;
//! ```

pub use crate::{
    Completion, ContentType, Error, HyperClient, Interceptor, Method, Modifier, Multipart, Next,
    Part, Provider, Request, RequestBuilder, Response, Result, Transport, interceptor_fn,
    modifier_fn,
};
pub use serde::{Deserialize, Serialize};
