//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that all pipeline stages
//! implement. A stage sees the request on the way in and the typed
//! [`Outcome`] on the way out.
//!
//! # Example
//!
//! ```
//! use veneer_middleware::{BoxFuture, Middleware, Next, Outcome, Request};
//! use veneer_middleware::context::MiddlewareContext;
//!
//! struct Noop;
//!
//! impl Middleware for Noop {
//!     fn name(&self) -> &'static str {
//!         "noop"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Outcome> {
//!         Box::pin(async move { next.run(ctx, request).await })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::types::{Outcome, Request};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal handler a chain ends in.
pub type HandlerFn<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Outcome> + Send + 'a>;

/// The core middleware trait.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once
/// - A stage that does not call `next` short-circuits with its own outcome
/// - A stage returns downstream errors unchanged unless converting them is
///   its job
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this middleware stage.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome>;
}

/// Callback to invoke the next middleware in the chain.
///
/// Consumed by [`run`](Next::run), so it can be called at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(HandlerFn<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given middleware.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    ///
    /// Useful for driving a single stage in isolation.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Outcome> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or handler in the chain.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Outcome {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use veneer_middleware::FnMiddleware;
///
/// let stage = FnMiddleware::new("passthrough", |ctx, req, next| {
///     Box::pin(async move { next.run(ctx, req).await })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Outcome>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Outcome>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome> {
        (self.func)(ctx, request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reply;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use serde_json::json;

    struct Visit(Vec<&'static str>);

    struct TestMiddleware {
        name: &'static str,
    }

    impl Middleware for TestMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Outcome> {
            Box::pin(async move {
                let mut visited = ctx.remove_extension::<Visit>().unwrap_or(Visit(Vec::new()));
                visited.0.push(self.name);
                ctx.set_extension(visited);
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_handler() -> Next<'static> {
        Next::handler(|_ctx, _req| Box::pin(async { Outcome::Ok(Reply::ok(json!("OK"))) }))
    }

    #[tokio::test]
    async fn test_next_handler() {
        let mut ctx = MiddlewareContext::new();
        let reply = ok_handler().run(&mut ctx, request()).await.unwrap();
        assert_eq!(reply.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_chain() {
        let mw1 = TestMiddleware { name: "first" };
        let mw2 = TestMiddleware { name: "second" };
        let mut ctx = MiddlewareContext::new();

        let next = Next::new(&mw1, Next::new(&mw2, ok_handler()));
        let outcome = next.run(&mut ctx, request()).await;

        assert!(outcome.is_ok());
        assert_eq!(ctx.get_extension::<Visit>().unwrap().0, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuits() {
        let stage = FnMiddleware::new("deny", |_ctx, _req, _next| {
            Box::pin(async { Outcome::Err(veneer_core::PipelineError::business("DENIED", "no")) })
        });
        let mut ctx = MiddlewareContext::new();
        let outcome = stage.process(&mut ctx, request(), ok_handler()).await;
        assert_eq!(outcome.unwrap_err().code(), "DENIED");
        assert_eq!(stage.name(), "deny");
    }
}
