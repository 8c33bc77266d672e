//! Following HTTP redirects.

use futures_util::future::BoxFuture;
use tether_core::{Error, Interceptor, Method, Next, Request, Response, Result};
use tracing::debug;
use url::Url;

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Follows 301, 302, 303, 307 and 308 responses carrying a `Location`.
///
/// 301, 302 and 303 continue with a body-less `GET`; 307 and 308 keep the
/// method and the body. Relative locations resolve against the URL of the
/// request that was redirected. A redirect to another scheme, host or port
/// drops `Authorization`, `Proxy-Authorization` and `Cookie`.
#[derive(Debug, Clone, Copy)]
pub struct FollowRedirects {
    max_redirects: usize,
}

impl Default for FollowRedirects {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowRedirects {
    /// Follow up to [`DEFAULT_MAX_REDIRECTS`] redirects.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_redirects(DEFAULT_MAX_REDIRECTS)
    }

    /// Follow up to `max_redirects` redirects.
    #[must_use]
    pub const fn with_max_redirects(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

/// Dropped when a redirect leaves the original scheme, host and port.
const CREDENTIAL_HEADERS: [&str; 3] = ["Authorization", "Proxy-Authorization", "Cookie"];

const fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

const fn redirect_method(status: u16, original: Method) -> Method {
    match status {
        307 | 308 => original,
        _ => Method::Get,
    }
}

fn resolve_location(base: &Url, location: &str) -> Result<Url> {
    Url::parse(location)
        .or_else(|_| base.join(location))
        .map_err(Error::InvalidUrl)
}

/// The request to send after `response` redirected `current`.
fn follow(current: Request, response: &Response) -> Result<Request> {
    let location = response.header("Location").ok_or_else(|| {
        Error::InvalidRedirect("redirect response missing Location header".into())
    })?;

    let url = resolve_location(current.url(), location)?;
    let method = redirect_method(response.status(), current.method());
    let (original, previous, mut headers, body) = current.into_parts();

    if previous.origin() != url.origin() {
        for name in CREDENTIAL_HEADERS {
            headers.remove_ignore_case(name);
        }
    }

    let body = if method == original { body } else { None };
    if body.is_none() {
        headers.remove_ignore_case("Content-Type");
        headers.remove_ignore_case("Content-Length");
    }

    Ok(Request::from_parts(method, url, headers, body))
}

impl Interceptor for FollowRedirects {
    fn intercept(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            let mut current = request;
            let mut redirects = 0;

            loop {
                let response = next.run(current.clone()).await?;
                if !is_redirect(response.status()) {
                    return Ok(response);
                }

                if redirects >= self.max_redirects {
                    return Err(Error::TooManyRedirects {
                        count: redirects,
                        max: self.max_redirects,
                    });
                }

                current = follow(current, &response)?;
                redirects += 1;
                debug!(
                    status = response.status(),
                    location = %current.url(),
                    redirects,
                    "following redirect"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use bytes::Bytes;
    use tether_core::Headers;

    use super::*;

    fn post(url: &str) -> Request {
        let headers: Headers = [("Content-Type", "application/json"), ("X-Keep", "1")]
            .into_iter()
            .collect();
        let url = Url::parse(url).expect("url");
        Request::from_parts(Method::Post, url, headers, Some(Bytes::from_static(b"{}")))
    }

    fn redirect(status: u16, location: &str) -> Response {
        let headers: Headers = [("location", location)].into_iter().collect();
        Response::new(status, headers, Bytes::new())
    }

    #[test]
    fn redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            check!(is_redirect(status));
        }
        for status in [200, 300, 304, 404, 500] {
            check!(!is_redirect(status));
        }
    }

    #[test]
    fn see_other_switches_to_bodyless_get() {
        let next = follow(post("https://example.com/a/b"), &redirect(303, "c")).expect("follow");

        check!(next.method() == Method::Get);
        check!(next.url().as_str() == "https://example.com/a/c");
        check!(next.body().is_none());
        check!(next.header("Content-Type").is_none());
        check!(next.header("X-Keep") == Some("1"));
    }

    #[test]
    fn permanent_redirect_keeps_method_and_body() {
        let response = redirect(308, "https://other.example.com/new");
        let next = follow(post("https://example.com/old"), &response).expect("follow");

        check!(next.method() == Method::Post);
        check!(next.url().as_str() == "https://other.example.com/new");
        check!(next.body() == Some(&Bytes::from_static(b"{}")));
        check!(next.header("Content-Type") == Some("application/json"));
    }

    fn authorized(url: &str) -> Request {
        let headers: Headers = [
            ("Authorization", "Bearer secret"),
            ("cookie", "session=1"),
            ("Proxy-Authorization", "Basic cHJveHk="),
            ("X-Keep", "1"),
        ]
        .into_iter()
        .collect();
        Request::from_parts(Method::Get, Url::parse(url).expect("url"), headers, None)
    }

    #[test]
    fn cross_origin_redirect_drops_credentials() {
        let response = redirect(302, "https://evil.example.net/x");
        let next = follow(authorized("https://api.example.com/me"), &response).expect("follow");

        check!(next.url().host_str() == Some("evil.example.net"));
        check!(!next.headers().contains_ignore_case("Authorization"));
        check!(!next.headers().contains_ignore_case("Cookie"));
        check!(!next.headers().contains_ignore_case("Proxy-Authorization"));
        check!(next.header("X-Keep") == Some("1"));
    }

    #[test]
    fn scheme_or_port_change_drops_credentials() {
        for location in ["http://api.example.com/me", "https://api.example.com:8443/me"] {
            let response = redirect(301, location);
            let next = follow(authorized("https://api.example.com/"), &response).expect("follow");
            check!(next.header("Authorization").is_none());
        }
    }

    #[test]
    fn same_origin_redirect_keeps_credentials() {
        let response = redirect(302, "/v2/me");
        let next = follow(authorized("https://api.example.com/me"), &response).expect("follow");

        check!(next.url().as_str() == "https://api.example.com/v2/me");
        check!(next.header("Authorization") == Some("Bearer secret"));
        check!(next.header("cookie") == Some("session=1"));
    }

    #[tokio::test]
    async fn bearer_token_is_not_sent_to_another_host() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);
        let next = Next::new(move |request: Request| {
            let sink = std::sync::Arc::clone(&sink);
            async move {
                let host = request.url().host_str().unwrap_or_default().to_owned();
                let auth = request.header("Authorization").map(str::to_owned);
                sink.lock().expect("lock").push((host.clone(), auth));
                if host == "api.example.com" {
                    Ok(redirect(302, "https://evil.example.net/x"))
                } else {
                    Ok(Response::new(200, Headers::new(), Bytes::new()))
                }
            }
        });

        let request = authorized("https://api.example.com/");
        let result = FollowRedirects::new().intercept(request, next).await;
        let_assert!(Ok(_) = result);

        let seen = seen.lock().expect("lock");
        check!(seen.len() == 2);
        check!(seen.first().and_then(|(_, auth)| auth.as_deref()) == Some("Bearer secret"));
        check!(seen.last().and_then(|(_, auth)| auth.as_deref()).is_none());
    }

    #[test]
    fn missing_location_is_invalid() {
        let response = Response::new(302, Headers::new(), Bytes::new());
        let result = follow(post("https://example.com/"), &response);
        let_assert!(Err(Error::InvalidRedirect(_)) = result);
    }

    #[tokio::test]
    async fn loops_stop_at_the_limit() {
        let next = Next::new(|_request: Request| async { Ok(redirect(302, "/again")) });

        let result = FollowRedirects::with_max_redirects(3)
            .intercept(post("https://example.com/"), next)
            .await;
        let_assert!(Err(Error::TooManyRedirects { count: 3, max: 3 }) = result);
    }

    #[tokio::test]
    async fn final_response_is_returned() {
        let next = Next::new(|request: Request| async move {
            if request.url().path() == "/start" {
                Ok(redirect(301, "/end"))
            } else {
                Ok(Response::new(200, Headers::new(), request.url().path().to_owned()))
            }
        });

        let result = FollowRedirects::new()
            .intercept(post("https://example.com/start"), next)
            .await;
        let_assert!(Ok(response) = result);
        check!(response.status() == 200);
        check!(response.body().as_ref() == b"/end");
    }
}
