//! Request modifiers.
//!
//! A [`Modifier`] mutates a [`RequestBuilder`] before it is finalized, e.g.
//! to inject a default header or a query parameter. Modifiers run in
//! registration order and the first failure aborts the call.

use std::fmt;

use crate::{RequestBuilder, Result};

/// Pre-finalization mutation of a request builder.
pub trait Modifier: Send + Sync + 'static {
    /// Mutate the builder.
    fn modify(&self, builder: &mut RequestBuilder) -> Result<()>;
}

/// Modifier built from a closure. See [`modifier_fn`].
#[derive(Clone)]
pub struct FnModifier<F> {
    f: F,
}

impl<F> fmt::Debug for FnModifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModifier").finish_non_exhaustive()
    }
}

impl<F> Modifier for FnModifier<F>
where
    F: Fn(&mut RequestBuilder) -> Result<()> + Send + Sync + 'static,
{
    fn modify(&self, builder: &mut RequestBuilder) -> Result<()> {
        (self.f)(builder)
    }
}

/// Turn a closure into a [`Modifier`].
///
/// ```
/// use tether_core::{Method, Modifier, RequestBuilder, modifier_fn};
///
/// let user_agent = modifier_fn(|builder: &mut RequestBuilder| {
///     builder.header("User-Agent", "tether");
///     Ok(())
/// });
///
/// let mut builder = RequestBuilder::new("https://example.com", Method::Get, "/");
/// user_agent.modify(&mut builder).expect("modify");
/// assert_eq!(builder.headers().get("User-Agent"), Some("tether"));
/// ```
pub fn modifier_fn<F>(f: F) -> FnModifier<F>
where
    F: Fn(&mut RequestBuilder) -> Result<()> + Send + Sync + 'static,
{
    FnModifier { f }
}

/// Inserts headers the builder does not already carry.
///
/// ```
/// use tether_core::{DefaultHeaders, Method, Modifier, RequestBuilder};
///
/// let defaults = DefaultHeaders::new().header("Accept", "application/json");
/// let mut builder = RequestBuilder::new("https://example.com", Method::Get, "/");
/// defaults.modify(&mut builder).expect("modify");
/// assert_eq!(builder.headers().get("Accept"), Some("application/json"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: crate::Headers,
}

impl DefaultHeaders {
    /// No default headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Modifier for DefaultHeaders {
    fn modify(&self, builder: &mut RequestBuilder) -> Result<()> {
        for (name, value) in &self.headers {
            if !builder.headers().contains_ignore_case(name) {
                builder.header(name.as_str(), value.as_str());
            }
        }
        Ok(())
    }
}
