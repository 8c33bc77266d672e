//! Request accumulation and finalization.
//!
//! A [`RequestBuilder`] collects the pieces of one call (method, path, path
//! parameters, headers, query pairs, body) and resolves them in two steps:
//! [`RequestBuilder::full_url`] and [`RequestBuilder::body_and_headers`].
//! Both may fail; failures surface as build-time errors before any
//! interceptor or transport runs.
//!
//! # Example
//!
//! ```
//! use tether_core::{Method, RequestBuilder};
//!
//! let mut builder = RequestBuilder::new("https://api.example.com/v1", Method::Get, "/users/{id}");
//! builder
//!     .parameter("id", "42")
//!     .query("expand", "teams")
//!     .header("Accept", "application/json");
//!
//! let url = builder.full_url().expect("valid URL");
//! assert_eq!(url.as_str(), "https://api.example.com/v1/users/42?expand=teams");
//! ```

use bytes::Bytes;
use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::{ContentType, Error, Headers, Method, Multipart, Result};

/// Characters left as-is inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const CONTENT_TYPE: &str = "Content-Type";

/// Explicit request body.
#[derive(Debug, Clone, PartialEq)]
enum Content {
    Raw {
        data: Bytes,
        content_type: Option<String>,
    },
    Multipart(Multipart),
}

/// Mutable accumulator for a single call.
///
/// Owned by exactly one in-flight call. Modifiers receive it by `&mut`
/// before finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBuilder {
    base_url: String,
    method: Method,
    path: String,
    parameters: IndexMap<String, String>,
    headers: Headers,
    queries: Vec<(String, String)>,
    content: Option<Content>,
    fields: IndexMap<String, serde_json::Value>,
    field_encoding: ContentType,
}

impl RequestBuilder {
    /// Creates a builder seeded with a base URL, method and path.
    #[must_use]
    pub fn new(base_url: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method,
            path: path.into(),
            parameters: IndexMap::new(),
            headers: Headers::new(),
            queries: Vec::new(),
            content: None,
            fields: IndexMap::new(),
            field_encoding: ContentType::Json,
        }
    }

    /// Base URL the path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template, before parameter substitution.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Headers set so far.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Query pairs set so far, in insertion order.
    #[must_use]
    pub fn queries(&self) -> &[(String, String)] {
        &self.queries
    }

    /// Replace the method.
    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// Replace the path template.
    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = path.into();
        self
    }

    /// Bind a `{name}` placeholder of the path.
    pub fn parameter(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.parameters.insert(name.into(), value.to_string());
        self
    }

    /// Set a header, replacing a previous value with the same name.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Set several headers.
    pub fn headers_from<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers);
        self
    }

    /// Append a query pair. Repeated names are kept.
    pub fn query(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.queries.push((name.into(), value.to_string()));
        self
    }

    /// Append query pairs from a serializable value.
    pub fn query_params<T: serde::Serialize + ?Sized>(&mut self, params: &T) -> Result<&mut Self> {
        self.queries.extend(crate::to_query_pairs(params)?);
        Ok(self)
    }

    /// Set a raw body without a content type.
    pub fn body(&mut self, data: impl Into<Bytes>) -> &mut Self {
        self.content = Some(Content::Raw {
            data: data.into(),
            content_type: None,
        });
        self
    }

    /// Set a raw body with its content type.
    pub fn body_with_type(
        &mut self,
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> &mut Self {
        self.content = Some(Content::Raw {
            data: data.into(),
            content_type: Some(content_type.into()),
        });
        self
    }

    /// Set a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        let data = crate::to_json(value)?;
        Ok(self.body_with_type(data, ContentType::Json.as_str()))
    }

    /// Set a form URL-encoded body.
    pub fn form<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        let data = crate::to_form(value)?;
        Ok(self.body_with_type(data, ContentType::FormUrlEncoded.as_str()))
    }

    /// Set a multipart body.
    pub fn multipart(&mut self, form: Multipart) -> &mut Self {
        self.content = Some(Content::Multipart(form));
        self
    }

    /// Add a top-level body field, encoded at finalization with
    /// [`RequestBuilder::field_encoding`].
    pub fn field<T: serde::Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self> {
        self.fields
            .insert(name.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Choose how fields are encoded: JSON (default) or form URL-encoded.
    pub fn field_encoding(&mut self, encoding: ContentType) -> &mut Self {
        self.field_encoding = encoding;
        self
    }

    /// Resolve the absolute target URL.
    ///
    /// Substitutes path parameters, joins base URL and path with a single
    /// `/`, and appends query pairs in insertion order.
    pub fn full_url(&self) -> Result<Url> {
        let path = self.resolved_path()?;
        let base = self.base_url.trim_end_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        let mut url = Url::parse(&joined)?;
        if url.cannot_be_a_base() {
            return Err(Error::invalid_request(format!(
                "`{joined}` is not an absolute hierarchical URL"
            )));
        }
        if !self.queries.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.queries);
        }
        Ok(url)
    }

    /// Resolve the final body and headers.
    ///
    /// Adds a `Content-Type` header unless one was set explicitly.
    pub fn body_and_headers(&self) -> Result<(Option<Bytes>, Headers)> {
        let mut headers = self.headers.clone();

        let (body, content_type) = match (&self.content, self.fields.is_empty()) {
            (Some(_), false) => {
                return Err(Error::invalid_request(
                    "a request cannot carry both an explicit body and body fields",
                ));
            }
            (Some(Content::Raw { data, content_type }), true) => {
                (Some(data.clone()), content_type.clone())
            }
            (Some(Content::Multipart(form)), true) => {
                (Some(form.encode()), Some(form.content_type()))
            }
            (None, false) => {
                let data = match self.field_encoding {
                    ContentType::FormUrlEncoded => crate::to_form(&self.fields)?,
                    _ => crate::to_json(&self.fields)?,
                };
                let content_type = match self.field_encoding {
                    ContentType::FormUrlEncoded => ContentType::FormUrlEncoded,
                    _ => ContentType::Json,
                };
                (Some(data), Some(content_type.as_str().to_string()))
            }
            (None, true) => (None, None),
        };

        if let Some(content_type) = content_type
            && !headers.contains_ignore_case(CONTENT_TYPE)
        {
            headers.insert(CONTENT_TYPE, content_type);
        }

        Ok((body, headers))
    }

    fn resolved_path(&self) -> Result<String> {
        let mut resolved = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();

        while let Some(start) = rest.find('{') {
            let (before, after) = rest.split_at(start);
            resolved.push_str(before);

            let end = after
                .find('}')
                .ok_or_else(|| Error::invalid_request(format!("unclosed `{{` in path `{}`", self.path)))?;
            let name = after.get(1..end).unwrap_or_default();
            let value = self
                .parameters
                .get(name)
                .ok_or_else(|| Error::MissingParameter(name.to_string()))?;
            resolved.extend(utf8_percent_encode(value, PATH_SEGMENT));

            rest = after.get(end + 1..).unwrap_or_default();
        }
        resolved.push_str(rest);

        Ok(resolved)
    }
}
