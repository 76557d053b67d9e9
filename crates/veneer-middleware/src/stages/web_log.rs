//! Web instrumentation.
//!
//! Sits closest to the handler and emits one [`WebLogRecord`] per dispatched
//! request: the handler identity, the request path, the arguments the handler
//! extracted, and either the result with timing or the error.

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Outcome, Request};
use veneer_telemetry::{deliver, LogSink, Stopwatch, TimePattern, WebLogRecord};

/// Emits a [`WebLogRecord`] for every handler invocation.
#[derive(Clone)]
pub struct WebLogMiddleware {
    sink: Arc<dyn LogSink<WebLogRecord>>,
    pattern: TimePattern,
}

impl std::fmt::Debug for WebLogMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebLogMiddleware")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl WebLogMiddleware {
    /// Creates the stage over a sink.
    pub fn new(sink: Arc<dyn LogSink<WebLogRecord>>, pattern: TimePattern) -> Self {
        Self { sink, pattern }
    }
}

impl Middleware for WebLogMiddleware {
    fn name(&self) -> &'static str {
        "web_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let handler = ctx.handler();
            let url = request.uri().path().to_string();
            let captured = ctx.captured_args().clone();
            let stopwatch = Stopwatch::start();

            let outcome = next.run(ctx, request).await;

            let mut record = WebLogRecord {
                class_name: handler.map(|h| h.class_name().to_string()).unwrap_or_default(),
                method_name: handler.map(|h| h.method().to_string()).unwrap_or_default(),
                url: Some(url),
                params: captured.to_params(),
                result: None,
                throwable: None,
                start_time: None,
                end_time: None,
                elapsed_millis: None,
            };
            match &outcome {
                Ok(reply) => {
                    let timing = stopwatch.finish(&self.pattern);
                    record.result = Some(reply.body().to_value());
                    record.start_time = Some(timing.start_time);
                    record.end_time = Some(timing.end_time);
                    record.elapsed_millis = Some(timing.elapsed_millis);
                }
                Err(err) => record.throwable = Some(err.to_string()),
            }
            deliver(self.sink.as_ref(), &record);
            outcome
        })
    }
}
