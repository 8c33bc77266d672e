//! Per-call chain composition.
//!
//! Interceptors are folded in reverse registration order around a terminal
//! step, so the first registered interceptor ends up outermost: it sees the
//! original request first and the final response last.
//!
//! The callback chain reuses the suspending [`Interceptor`] contract. Each
//! folded step spawns the interceptor future on a runtime and hands it a
//! [`Next`] that bridges back to the callback-based inner step through a
//! one-shot channel.

use std::sync::Arc;

use tether_core::{Completion, Error, Interceptor, Next, Request, Transport};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Callback-style step: consumes a request and reports through a completion.
pub(crate) type Step = Arc<dyn Fn(Request, Completion) + Send + Sync>;

/// Compose the suspending chain for one call.
pub(crate) fn compose<T: Transport>(
    transport: &Arc<T>,
    interceptors: &[Arc<dyn Interceptor>],
) -> Next {
    let transport = Arc::clone(transport);
    let terminal = Next::new(move |request: Request| {
        let transport = Arc::clone(&transport);
        async move { transport.execute(request).await }
    });

    interceptors.iter().rev().fold(terminal, |next, interceptor| {
        let interceptor = Arc::clone(interceptor);
        Next::new(move |request: Request| {
            let interceptor = Arc::clone(&interceptor);
            let next = next.clone();
            async move { interceptor.intercept(request, next).await }
        })
    })
}

/// Compose the callback chain for one call.
///
/// Every interceptor step is spawned on `runtime`; the terminal step is
/// the transport's own callback entry point.
pub(crate) fn compose_callback<T: Transport>(
    transport: &Arc<T>,
    interceptors: &[Arc<dyn Interceptor>],
    runtime: &Handle,
) -> Step {
    let transport = Arc::clone(transport);
    let terminal: Step = Arc::new(move |request: Request, completion: Completion| {
        transport.execute_with(request, completion);
    });

    interceptors.iter().rev().fold(terminal, |inner, interceptor| {
        let interceptor = Arc::clone(interceptor);
        let runtime = runtime.clone();
        let step: Step = Arc::new(move |request: Request, completion: Completion| {
            let interceptor = Arc::clone(&interceptor);
            let next = suspend(Arc::clone(&inner));
            runtime.spawn(async move {
                let result = interceptor.intercept(request, next).await;
                completion.complete(result);
            });
        });
        step
    })
}

/// Turn a callback step into a suspending [`Next`].
///
/// The step only starts when the returned future is polled, and each run
/// gets its own channel, so an interceptor may call `next` several times.
fn suspend(step: Step) -> Next {
    Next::new(move |request: Request| {
        let step = Arc::clone(&step);
        async move {
            let (sender, receiver) = oneshot::channel();
            step(
                request,
                Completion::new(move |result| {
                    // receiver gone means the awaiting interceptor was dropped
                    let _ = sender.send(result);
                }),
            );
            receiver.await.unwrap_or(Err(Error::Abandoned))
        }
    })
}
