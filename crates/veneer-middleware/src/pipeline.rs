//! Fixed-order middleware pipeline.
//!
//! Stages are registered with the [`Stage`] slot they occupy and always run in
//! slot order, whatever order they were added in:
//!
//! 1. **Request ID** - assign or propagate `x-request-id`
//! 2. **Response Envelope** - rewrite the body into `{code, message, data}`
//! 3. **Error Normalization** - turn a `PipelineError` into a classified reply
//! 4. **Flow Limit** - reject requests above the in-flight limit
//! 5. **Extension** - application supplied stages
//! 6. **Web Log** - record arguments, result and timing of the handler
//!
//! The handler runs after the last stage. The typed [`Reply`] is serialized
//! only once every stage has returned.
//!
//! An error that leaves the last stage unconverted is rendered as a bare
//! `{code, message}` body with the error's status, whatever the envelope
//! settings. Param and business messages left blank are filled from the
//! builder's catalog, else [`MESSAGE_NOT_DEFINED`](veneer_core::MESSAGE_NOT_DEFINED).

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Outcome, Reply, ReplyBody, Request, Response};
use std::sync::Arc;
use veneer_core::{Envelope, MessageCatalog, MessageSource, PipelineError, SYSTEM, VALIDATION};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The fixed-order middleware pipeline.
///
/// # Example
///
/// ```
/// use veneer_middleware::pipeline::{Pipeline, Stage};
/// use veneer_middleware::stages::RequestIdMiddleware;
///
/// let pipeline = Pipeline::builder()
///     .stage(Stage::RequestId, RequestIdMiddleware::new())
///     .build();
/// assert_eq!(pipeline.stage_names(), vec!["request_id"]);
/// ```
pub struct Pipeline {
    stages: Vec<(Stage, BoxedMiddleware)>,
    catalog: Option<Arc<dyn MessageSource>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs the request through every stage and the handler.
    ///
    /// Returns the typed outcome without serializing it.
    pub async fn dispatch<H>(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Outcome
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Outcome> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(ctx, request).await
    }

    /// Processes a request through the entire pipeline and serializes the
    /// result.
    ///
    /// An error no stage converted (error normalization disabled) is rendered
    /// as a `{code, message}` body with the error's own status.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Outcome> + Send + 'static,
    {
        match self.dispatch(&mut ctx, request, handler).await {
            Ok(reply) => reply.into_response(),
            Err(err) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    kind = err.kind(),
                    error = %err,
                    "unhandled pipeline error"
                );
                self.render_unhandled(err).into_response()
            }
        }
    }

    fn render_unhandled(&self, err: PipelineError) -> Reply {
        let status = err.status_code();
        let envelope = match err {
            PipelineError::Param(mut record) | PipelineError::Business(mut record) => {
                let fallback = MessageCatalog::new();
                let source: &dyn MessageSource = self.catalog.as_deref().unwrap_or(&fallback);
                record.resolve_message(source);
                Envelope::from_record(&record)
            }
            PipelineError::Validation { message, .. } => Envelope::error(VALIDATION, message),
            system @ PipelineError::System { .. } => Envelope::error(SYSTEM, system.to_string()),
        };
        Reply::new(status, ReplyBody::Envelope(envelope))
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Outcome> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for (_, middleware) in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(_, mw)| mw.name()).collect()
    }

    /// Returns the slots occupied, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.iter().map(|(stage, _)| *stage).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<(Stage, BoxedMiddleware)>,
    catalog: Option<Arc<dyn MessageSource>>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `middleware` in the given slot.
    ///
    /// Several stages may share the [`Stage::Extension`] slot; they keep
    /// their registration order.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, stage: Stage, middleware: M) -> Self {
        self.stage_boxed(stage, Arc::new(middleware))
    }

    /// Registers an already shared middleware in the given slot.
    #[must_use]
    pub fn stage_boxed(mut self, stage: Stage, middleware: BoxedMiddleware) -> Self {
        self.stages.push((stage, middleware));
        self
    }

    /// Registers `middleware` in the given slot when `enabled` is set.
    #[must_use]
    pub fn stage_if<M: Middleware>(self, enabled: bool, stage: Stage, middleware: M) -> Self {
        if enabled {
            self.stage(stage, middleware)
        } else {
            self
        }
    }

    /// Sets the catalog used for unconverted errors with a blank message.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<dyn MessageSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds the pipeline, ordering stages by slot.
    #[must_use]
    pub fn build(mut self) -> Pipeline {
        self.stages.sort_by_key(|(stage, _)| *stage);
        Pipeline {
            stages: self.stages,
            catalog: self.catalog,
        }
    }
}

/// Pipeline slot, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Request ID generation/propagation
    RequestId = 1,
    /// Stage 2: Success/error envelope
    ResponseEnvelope = 2,
    /// Stage 3: Error classification
    ErrorNormalization = 3,
    /// Stage 4: In-flight limit
    FlowLimit = 4,
    /// Stage 5: Application stages
    Extension = 5,
    /// Stage 6: Web instrumentation, closest to the handler
    WebLog = 6,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::ResponseEnvelope => "response_envelope",
            Self::ErrorNormalization => "error_normalization",
            Self::FlowLimit => "flow_limit",
            Self::Extension => "extension",
            Self::WebLog => "web_log",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 6] {
        [
            Self::RequestId,
            Self::ResponseEnvelope,
            Self::ErrorNormalization,
            Self::FlowLimit,
            Self::Extension,
            Self::WebLog,
        ]
    }
}
