//! Request correlation.
//!
//! The outermost stage. It fixes the [`RequestId`] of the exchange, opens the
//! `request` span every later log line of the exchange is recorded under, and
//! echoes the id in the `x-request-id` response header.

use http::HeaderValue;
use tracing::Instrument;
use uuid::Uuid;
use veneer_core::RequestId;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Outcome, Request};

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns each request its id.
///
/// Incoming ids are ignored unless the stage was built with
/// [`trusting`](Self::trusting), in which case a valid UUID header is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Always generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps a well-formed incoming `x-request-id`.
    #[must_use]
    pub fn trusting() -> Self {
        Self { trust_incoming: true }
    }

    fn resolve(self, request: &Request) -> RequestId {
        if !self.trust_incoming {
            return RequestId::new();
        }
        let Some(raw) = request.headers().get(REQUEST_ID_HEADER) else {
            return RequestId::new();
        };
        match raw.to_str().ok().map(Uuid::parse_str) {
            Some(Ok(uuid)) => RequestId::from_uuid(uuid),
            _ => {
                tracing::debug!(header = ?raw, "discarding malformed incoming request id");
                RequestId::new()
            }
        }
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let request_id = self.resolve(&request);
            ctx.set_request_id(request_id);
            let span = tracing::info_span!(
                "request",
                request_id = %request_id,
                method = %request.method(),
                path = request.uri().path(),
            );

            let mut outcome = next.run(ctx, request).instrument(span).await;

            // Errors get the header once normalization has turned them into replies.
            if let Ok(reply) = outcome.as_mut() {
                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    reply.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
            }
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reply;
    use bytes::Bytes;
    use http_body_util::Full;
    use serde_json::json;
    use veneer_core::PipelineError;

    fn request(incoming: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/user/1");
        if let Some(id) = incoming {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn ok_handler() -> Next<'static> {
        Next::handler(|_ctx, _req| Box::pin(async { Outcome::Ok(Reply::ok(json!({"id": 1}))) }))
    }

    async fn echoed(stage: RequestIdMiddleware, ctx: &mut MiddlewareContext, incoming: Option<&str>) -> String {
        let reply = stage.process(ctx, request(incoming), ok_handler()).await.unwrap();
        reply.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_header_matches_context() {
        let mut ctx = MiddlewareContext::new();
        let header = echoed(RequestIdMiddleware::new(), &mut ctx, None).await;
        assert_eq!(ctx.request_id().to_string(), header);
    }

    #[tokio::test]
    async fn test_untrusted_incoming_is_replaced() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";
        let mut ctx = MiddlewareContext::new();
        assert_ne!(echoed(RequestIdMiddleware::new(), &mut ctx, Some(incoming)).await, incoming);
    }

    #[tokio::test]
    async fn test_trusted_incoming_is_kept() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";
        let mut ctx = MiddlewareContext::new();
        assert_eq!(echoed(RequestIdMiddleware::trusting(), &mut ctx, Some(incoming)).await, incoming);
        assert_eq!(ctx.request_id().to_string(), incoming);
    }

    #[tokio::test]
    async fn test_trusted_malformed_incoming_is_replaced() {
        let mut ctx = MiddlewareContext::new();
        let header = echoed(RequestIdMiddleware::trusting(), &mut ctx, Some("user-1")).await;
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[tokio::test]
    async fn test_errors_pass_through_untouched() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Outcome::Err(PipelineError::business_code("USER_1001")) })
        });
        let outcome = RequestIdMiddleware::new().process(&mut ctx, request(None), next).await;
        assert_eq!(outcome.unwrap_err().code(), "USER_1001");
    }
}
