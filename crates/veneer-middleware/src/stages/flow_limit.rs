//! In-flight request limit.
//!
//! Requests above the limit are rejected immediately with a business error,
//! which the error normalization stage turns into a regular error envelope.

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Outcome, Request};
use tokio::sync::Semaphore;
use veneer_core::PipelineError;

/// Rejects requests once `max_concurrent` are in flight.
#[derive(Debug, Clone)]
pub struct FlowLimitMiddleware {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    code: String,
    message: String,
}

impl FlowLimitMiddleware {
    /// Creates the limiter.
    ///
    /// Limits above [`Semaphore::MAX_PERMITS`] are clamped to it.
    #[must_use]
    pub fn new(max_concurrent: usize, code: impl Into<String>, message: impl Into<String>) -> Self {
        let max_concurrent = max_concurrent.min(Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the configured limit.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Returns the number of requests that could still be admitted.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Middleware for FlowLimitMiddleware {
    fn name(&self) -> &'static str {
        "flow_limit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let Ok(_permit) = self.permits.try_acquire() else {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    max_concurrent = self.max_concurrent,
                    "request rejected by flow limit"
                );
                return Err(PipelineError::business(&self.code, &self.message));
            };
            next.run(ctx, request).await
        })
    }
}
