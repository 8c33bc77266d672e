//! Pipeline ordering and failure properties, checked in both call styles
//! against in-memory transports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert2::{check, let_assert};
use tether::{
    Completion, Error, Headers, Interceptor, Method, Next, Provider, Request, RequestBuilder,
    Response, Result, Transport, interceptor_fn, modifier_fn,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

type Log = Arc<Mutex<Vec<String>>>;

/// Answers `200 OK` with the request headers and body, counting calls.
#[derive(Default)]
struct Echo {
    calls: AtomicUsize,
}

impl Echo {
    fn respond(&self, request: Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (_, _, headers, body) = request.into_parts();
        Ok(Response::new(200, headers, body.unwrap_or_default()))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for Echo {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.respond(request)
    }

    fn execute_with(&self, request: Request, completion: Completion) {
        completion.complete(self.respond(request));
    }
}

/// Fails the first call with a connection error, then echoes.
#[derive(Default)]
struct Flaky {
    echo: Echo,
}

impl Flaky {
    fn respond(&self, request: Request) -> Result<Response> {
        if self.echo.calls() == 0 {
            self.echo.calls.fetch_add(1, Ordering::SeqCst);
            return Err(Error::connection("connection reset"));
        }
        self.echo.respond(request)
    }
}

impl Transport for Flaky {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.respond(request)
    }

    fn execute_with(&self, request: Request, completion: Completion) {
        completion.complete(self.respond(request));
    }
}

/// Loses every completion it is handed.
struct BlackHole;

impl Transport for BlackHole {
    async fn execute(&self, _request: Request) -> Result<Response> {
        Err(Error::Abandoned)
    }

    fn execute_with(&self, _request: Request, completion: Completion) {
        drop(completion);
    }
}

fn echo_provider() -> Provider<Echo> {
    Provider::new("https://api.example.com", Echo::default())
}

/// Records `<name>:start` before and `<name>:end` after the rest of the chain.
fn recording(log: &Log, name: &'static str) -> impl Interceptor {
    let log = Arc::clone(log);
    interceptor_fn(move |request: Request, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().expect("lock").push(format!("{name}:start"));
            let result = next.run(request).await;
            log.lock().expect("lock").push(format!("{name}:end"));
            result
        }
    })
}

async fn via_callback<T: Transport>(
    provider: &Provider<T>,
    builder: &mut RequestBuilder,
) -> Result<Response> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    provider.request_with(builder, move |result| {
        let _ = sender.send(result);
    });

    let first = timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("callback invoked in time")
        .expect("callback invoked");
    // the sender is dropped with the callback: nothing more may arrive
    let rest = timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("callback released");
    check!(rest.is_none(), "callback invoked more than once");
    first
}

#[tokio::test]
async fn test_example_pipeline_in_both_styles() {
    let log: Log = Arc::default();
    let mut provider = echo_provider();
    provider
        .modify_requests(|builder| {
            builder.header("X-Test", "1");
            Ok(())
        })
        .add_interceptor(recording(&log, "log"));

    let mut builder = provider.new_builder(Method::Post, "/echo");
    builder.body("original");
    let awaited = provider.request(&mut builder).await.expect("response");

    let mut builder = provider.new_builder(Method::Post, "/echo");
    builder.body("original");
    let called_back = via_callback(&provider, &mut builder).await.expect("response");

    check!(awaited.status() == 200);
    check!(awaited.header("X-Test") == Some("1"));
    check!(awaited.body().as_ref() == b"original");
    check!(awaited == called_back);
    check!(*log.lock().expect("lock") == ["log:start", "log:end", "log:start", "log:end"]);
    check!(provider.transport().calls() == 2);
}

#[tokio::test]
async fn test_hook_order_is_identical_in_both_styles() {
    let awaited_log: Log = Arc::default();
    let callback_log: Log = Arc::default();
    let awaited = echo_provider()
        .with_interceptor(recording(&awaited_log, "a"))
        .with_interceptor(recording(&awaited_log, "b"))
        .with_interceptor(recording(&awaited_log, "c"));
    let callback = echo_provider()
        .with_interceptor(recording(&callback_log, "a"))
        .with_interceptor(recording(&callback_log, "b"))
        .with_interceptor(recording(&callback_log, "c"));

    let mut builder = awaited.new_builder(Method::Get, "/");
    awaited.request(&mut builder).await.expect("response");
    let mut builder = callback.new_builder(Method::Get, "/");
    via_callback(&callback, &mut builder).await.expect("response");

    let expected = ["a:start", "b:start", "c:start", "c:end", "b:end", "a:end"];
    check!(*awaited_log.lock().expect("lock") == expected);
    check!(*callback_log.lock().expect("lock") == expected);
}

#[tokio::test]
async fn test_first_registered_sees_original_request_and_final_response() {
    let seen: Arc<Mutex<Vec<(Option<String>, Option<String>)>>> = Arc::default();
    let outer_seen = Arc::clone(&seen);

    let outer = interceptor_fn(move |request: Request, next: Next| {
        let seen = Arc::clone(&outer_seen);
        async move {
            let before = request.header("X-Inner").map(str::to_owned);
            let response = next.run(request).await?;
            let after = response.header("X-Inner-Response").map(str::to_owned);
            seen.lock().expect("lock").push((before, after));
            Ok(response)
        }
    });
    let inner = interceptor_fn(|request: Request, next: Next| async move {
        let response = next.run(request.with_header("X-Inner", "1")).await?;
        let (status, mut headers, body) = response.into_parts();
        headers.insert("X-Inner-Response", "1");
        Ok(Response::new(status, headers, body))
    });
    let provider = echo_provider().with_interceptor(outer).with_interceptor(inner);

    let mut builder = provider.new_builder(Method::Get, "/");
    let response = provider.request(&mut builder).await.expect("response");
    let mut builder = provider.new_builder(Method::Get, "/");
    via_callback(&provider, &mut builder).await.expect("response");

    check!(response.header("X-Inner") == Some("1"));
    let seen = seen.lock().expect("lock");
    check!(seen.len() == 2);
    for (before, after) in seen.iter() {
        check!(before.is_none());
        check!(after.as_deref() == Some("1"));
    }
}

#[tokio::test]
async fn test_modifier_failure_never_reaches_transport() {
    let log: Log = Arc::default();
    let later_ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later_ran);
    let provider = echo_provider()
        .with_modifier(modifier_fn(|_builder: &mut RequestBuilder| {
            Err(Error::invalid_request("missing credentials"))
        }))
        .with_modifier(modifier_fn(move |_builder: &mut RequestBuilder| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .with_interceptor(recording(&log, "never"));

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Err(Error::InvalidRequest(message)) = provider.request(&mut builder).await);
    check!(message == "missing credentials");

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Err(Error::InvalidRequest(_)) = via_callback(&provider, &mut builder).await);

    check!(provider.transport().calls() == 0);
    check!(later_ran.load(Ordering::SeqCst) == 0);
    check!(log.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn test_finalize_failure_in_both_styles() {
    let provider = echo_provider();

    let mut builder = provider.new_builder(Method::Get, "/users/{id}");
    let_assert!(Err(Error::MissingParameter(name)) = provider.request(&mut builder).await);
    check!(name == "id");

    let mut builder = provider.new_builder(Method::Get, "/users/{id}");
    let_assert!(Err(Error::MissingParameter(_)) = via_callback(&provider, &mut builder).await);

    check!(provider.transport().calls() == 0);
}

#[tokio::test]
async fn test_callback_reports_assembly_failure_before_returning() {
    let provider = echo_provider();
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);

    let mut builder = provider.new_builder(Method::Get, "/{unclosed");
    provider.request_with(&mut builder, move |result| {
        check!(result.is_err());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    check!(delivered.load(Ordering::SeqCst) == 1);
}

#[tokio::test]
async fn test_short_circuit_skips_transport() {
    let provider = echo_provider().with_interceptor(interceptor_fn(
        |_request: Request, _next: Next| async move {
            Ok(Response::new(304, Headers::new(), "cached"))
        },
    ));

    let mut builder = provider.new_builder(Method::Get, "/");
    let awaited = provider.request(&mut builder).await.expect("response");
    let mut builder = provider.new_builder(Method::Get, "/");
    let called_back = via_callback(&provider, &mut builder).await.expect("response");

    check!(awaited.status() == 304);
    check!(awaited.body().as_ref() == b"cached");
    check!(awaited == called_back);
    check!(provider.transport().calls() == 0);
}

#[tokio::test]
async fn test_interceptor_failure_propagates() {
    let log: Log = Arc::default();
    let provider = echo_provider()
        .with_interceptor(recording(&log, "outer"))
        .with_interceptor(interceptor_fn(|_request: Request, _next: Next| async move {
            Err(Error::interceptor("denied"))
        }));

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Err(Error::Interceptor(message)) = provider.request(&mut builder).await);
    check!(message == "denied");

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Err(Error::Interceptor(_)) = via_callback(&provider, &mut builder).await);

    check!(*log.lock().expect("lock") == ["outer:start", "outer:end", "outer:start", "outer:end"]);
    check!(provider.transport().calls() == 0);
}

#[tokio::test]
async fn test_retry_through_next_delivers_once() {
    let retry_once = interceptor_fn(|request: Request, next: Next| async move {
        match next.run(request.clone()).await {
            Err(error) if error.is_connection() => next.run(request).await,
            other => other,
        }
    });
    let provider =
        Provider::new("https://api.example.com", Flaky::default()).with_interceptor(retry_once);

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Ok(response) = via_callback(&provider, &mut builder).await);
    check!(response.status() == 200);
    check!(provider.transport().echo.calls() == 2);
}

#[tokio::test]
async fn test_repeated_calls_are_idempotent() {
    let provider = echo_provider().with_interceptor(interceptor_fn(
        |request: Request, next: Next| async move {
            next.run(request.with_header("X-Stamp", "fixed")).await
        },
    ));

    let mut responses = Vec::new();
    for _ in 0..3 {
        let mut builder = provider.new_builder(Method::Put, "/items/{id}");
        builder.parameter("id", 9).json(&serde_json::json!({"n": 1})).expect("json");
        responses.push(provider.request(&mut builder).await.expect("response"));
    }

    check!(responses.windows(2).all(|pair| pair.first() == pair.last()));
}

#[tokio::test]
async fn test_lost_completion_is_reported_as_abandoned() {
    let log: Log = Arc::default();
    let provider = Provider::new("https://api.example.com", BlackHole)
        .with_interceptor(recording(&log, "outer"));

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Err(Error::Abandoned) = via_callback(&provider, &mut builder).await);

    let bare = Provider::new("https://api.example.com", BlackHole);
    let mut builder = bare.new_builder(Method::Get, "/");
    let_assert!(Err(Error::Abandoned) = via_callback(&bare, &mut builder).await);
    check!(*log.lock().expect("lock") == ["outer:start", "outer:end"]);
}

#[tokio::test]
async fn test_panicking_interceptor_still_completes() {
    async fn explode(_request: Request, _next: Next) -> Result<Response> {
        panic!("interceptor bug")
    }
    let provider = echo_provider().with_interceptor(interceptor_fn(explode));

    let mut builder = provider.new_builder(Method::Get, "/");
    let_assert!(Err(Error::Abandoned) = via_callback(&provider, &mut builder).await);
    check!(provider.transport().calls() == 0);
}

#[test]
fn test_configured_runtime_serves_callers_outside_any_runtime() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let log: Log = Arc::default();
    let provider = echo_provider()
        .with_runtime(runtime.handle().clone())
        .with_interceptor(recording(&log, "outer"));

    let (sender, receiver) = std::sync::mpsc::channel();
    let mut builder = provider.new_builder(Method::Get, "/");
    provider.request_with(&mut builder, move |result| {
        let _ = sender.send(result);
    });

    let_assert!(Ok(Ok(response)) = receiver.recv_timeout(Duration::from_secs(5)));
    check!(response.status() == 200);
    check!(*log.lock().expect("lock") == ["outer:start", "outer:end"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_provider_serves_concurrent_calls() {
    let log: Log = Arc::default();
    let provider = Arc::new(echo_provider().with_interceptor(recording(&log, "x")));

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                let mut builder = provider.new_builder(Method::Post, "/");
                builder.body(format!("call-{n}"));
                if n % 2 == 0 {
                    provider.request(&mut builder).await
                } else {
                    via_callback(&provider, &mut builder).await
                }
            })
        })
        .collect();

    for (n, task) in tasks.into_iter().enumerate() {
        let response = task.await.expect("join").expect("response");
        check!(response.body().as_ref() == format!("call-{n}").as_bytes());
    }
    check!(provider.transport().calls() == 16);
    check!(log.lock().expect("lock").len() == 32);
}
