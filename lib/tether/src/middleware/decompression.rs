//! Response decompression.
//!
//! Advertises `Accept-Encoding: gzip, deflate, br, zstd` unless the request
//! already carries an `Accept-Encoding`, and decodes response bodies
//! according to their `Content-Encoding`. Unknown encodings are left alone.

use std::io::Read;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tether_core::{Error, Interceptor, Next, Request, Response, Result};

const ACCEPT_ENCODING: &str = "gzip, deflate, br, zstd";

/// Transparent gzip, deflate, brotli and zstd decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompression;

impl Decompression {
    /// Decode every supported encoding.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn decode_error(encoding: &str, error: &impl std::fmt::Display) -> Error {
    Error::connection(format!("{encoding} decompression failed: {error}"))
}

/// Decode `body` encoded with `encoding`. Returns `None` for unknown
/// encodings.
fn decompress(encoding: &str, body: &Bytes) -> Option<Result<Bytes>> {
    let mut decoded = Vec::new();
    let outcome = match encoding {
        "gzip" | "x-gzip" => flate2::read::GzDecoder::new(body.as_ref())
            .read_to_end(&mut decoded)
            .map(drop),
        "deflate" => flate2::read::ZlibDecoder::new(body.as_ref())
            .read_to_end(&mut decoded)
            .map(drop),
        "br" => brotli::BrotliDecompress(&mut body.as_ref(), &mut decoded),
        "zstd" => zstd::stream::copy_decode(body.as_ref(), &mut decoded),
        _ => return None,
    };

    Some(
        outcome
            .map(|()| Bytes::from(decoded))
            .map_err(|e| decode_error(encoding, &e)),
    )
}

impl Interceptor for Decompression {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let request = if request.headers().contains_ignore_case("Accept-Encoding") {
            request
        } else {
            request.with_header("Accept-Encoding", ACCEPT_ENCODING)
        };

        Box::pin(async move {
            let response = next.run(request).await?;
            let Some(encoding) = response
                .header("Content-Encoding")
                .map(|value| value.trim().to_ascii_lowercase())
            else {
                return Ok(response);
            };

            let Some(decoded) = decompress(&encoding, response.body()) else {
                return Ok(response);
            };
            let decoded = decoded?;

            let (status, mut headers, _) = response.into_parts();
            headers.remove_ignore_case("Content-Encoding");
            headers.remove_ignore_case("Content-Length");
            headers.insert("content-length", decoded.len().to_string());

            Ok(Response::new(status, headers, decoded))
        })
    }
}
