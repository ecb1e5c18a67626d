//! Middleware pipeline: composable before/after request handler logic.
//!
//! Each middleware wraps the next layer, enabling request inspection,
//! short-circuit responses, and response decoration without coupling handlers
//! to infrastructure concerns. The response cache is one such layer: it may
//! answer a request itself, or let it through and inspect what comes back.
//!
//! ## Core types
//!
//! - [`Middleware`]: trait implemented by all middleware.
//! - [`Next`]: cursor into the remaining middleware chain; call [`Next::run`] to
//!   advance to the next layer.
//! - [`MiddlewareHandler`]: type-erased, cheaply-cloneable middleware function.
//! - [`from_middleware`]: converts a [`Middleware`] into a [`MiddlewareHandler`].
//! - [`handler`]: wraps a terminal async function (the upstream) as the last stage.
//! - [`LoggerMiddleware`]: built-in request/response logger.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio::time::Instant;

use crate::cache::headers::{CacheStatus, status_of};
use crate::{Response, context::Context};

/// Boxed future returned by every pipeline stage.
pub type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A cursor into the remaining middleware chain for a single request.
///
/// Calling [`Next::run`] advances the cursor by one position and invokes the
/// next middleware (or returns a fallback `500` response when the chain is
/// exhausted without any stage generating a response).
///
/// `Next` is consumed on each call to [`run`](Self::run), so it cannot be called
/// more than once per middleware invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use respcache::{context::Context, middleware::{BoxResponseFuture, Middleware, Next}};
///
/// struct PassThrough;
///
/// impl Middleware for PassThrough {
///     fn handle(&self, ctx: Context, next: Next) -> BoxResponseFuture {
///         Box::pin(async move { next.run(ctx).await })
///     }
/// }
/// ```
pub struct Next {
    middlewares: Arc<[MiddlewareHandler]>,
    // Tracks which middleware to invoke on the next `run` call.
    index: usize,
}

/// A type-erased, reference-counted middleware function.
///
/// Every entry in the middleware stack is stored as a `MiddlewareHandler`.
/// The [`Arc`] wrapper makes handlers cheap to clone so that [`Next`] can
/// advance through the chain without copying closures.
pub type MiddlewareHandler =
    Arc<dyn Fn(Context, Next) -> BoxResponseFuture + Send + Sync + 'static>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use respcache::middleware::{LoggerMiddleware, from_middleware};
///
/// let handler = from_middleware(Arc::new(LoggerMiddleware));
/// ```
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// Wraps a terminal async function as the final pipeline stage.
///
/// The function never sees [`Next`]; it is the point where the request is
/// actually served (by the application or an upstream call).
///
/// # Examples
///
/// ```rust,no_run
/// use respcache::{Response, StatusCode, context::Context, middleware::handler};
///
/// let upstream = handler(|_ctx: Context| async {
///     Response::new(StatusCode::OK).body("{}")
/// });
/// ```
pub fn handler<H, F>(f: H) -> MiddlewareHandler
where
    H: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx: Context, _next: Next| Box::pin(f(ctx)) as BoxResponseFuture)
}

impl Next {
    /// Creates a new `Next` positioned at the start of the given middleware stack.
    pub fn new(middlewares: impl Into<Arc<[MiddlewareHandler]>>) -> Self {
        Self {
            middlewares: middlewares.into(),
            index: 0,
        }
    }

    /// Invokes the next middleware in the chain and returns its response.
    ///
    /// If no handler remains (the chain is exhausted without producing a
    /// response), a `500 Internal Server Error` response is returned as a safe
    /// fallback.
    pub async fn run(mut self, ctx: Context) -> Response {
        if self.index < self.middlewares.len() {
            let handler = self.middlewares[self.index].clone();
            self.index += 1;
            handler(ctx, self).await
        } else {
            Response::new(crate::StatusCode::INTERNAL_SERVER_ERROR)
                .body("No response generated by middleware pipeline")
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors receive a [`Context`] and a [`Next`] cursor. They may:
///
/// - **Pass through**: call `next.run(ctx).await` without modification.
/// - **Short-circuit**: return a [`Response`] directly without calling `next`.
/// - **Decorate**: call `next.run(ctx).await`, inspect the response, and return
///   a modified copy.
///
/// # Contract
///
/// - Implementations **must** be `Send + Sync` because middleware is shared across
///   Tokio tasks.
/// - Implementations **should not** hold `&mut` references to shared state across
///   an `.await` point.
pub trait Middleware: Send + Sync {
    /// Handle the request and optionally delegate to the next middleware.
    fn handle(&self, ctx: Context, next: Next) -> BoxResponseFuture;
}

/// Built-in middleware that logs each request's method, target, status,
/// cache outcome, and duration.
///
/// `LoggerMiddleware` does not short-circuit; it always delegates to the next
/// middleware and records the outcome after the fact. Place it before the
/// cache layer so cache hits are logged too.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponseFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().to_string();
            let target = ctx.request().path_with_query().to_owned();

            let response = next.run(ctx).await;

            let cache = status_of(response.headers()).map_or("-", CacheStatus::as_str);
            tracing::info!(
                %method,
                %target,
                status = response.status().as_u16(),
                %cache,
                elapsed = ?start.elapsed(),
                "request served"
            );

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Request, StatusCode};

    fn ctx(raw: &str) -> Context {
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        Context::new(req)
    }

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn handle(&self, _ctx: Context, _next: Next) -> BoxResponseFuture {
            Box::pin(async { Response::new(StatusCode::NO_CONTENT) })
        }
    }

    #[tokio::test]
    async fn empty_chain_falls_back_to_500() {
        let res = Next::new(Vec::new())
            .run(ctx("GET / HTTP/1.1\r\n\r\n"))
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn short_circuit_skips_later_stages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let stack = vec![
            from_middleware(Arc::new(LoggerMiddleware)),
            from_middleware(Arc::new(ShortCircuit)),
            handler(move |_ctx| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Response::new(StatusCode::OK) }
            }),
        ];

        let res = Next::new(stack).run(ctx("GET / HTTP/1.1\r\n\r\n")).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn terminal_handler_receives_request() {
        let stack = vec![handler(|ctx: Context| async move {
            Response::new(StatusCode::OK).body(ctx.request().path_with_query().to_owned())
        })];
        let res = Next::new(stack)
            .run(ctx("GET /a?b=1 HTTP/1.1\r\n\r\n"))
            .await;
        assert_eq!(res.body_ref(), b"/a?b=1");
    }
}
