//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! the request id, the handler the router selected, the arguments the handler
//! extracted, and typed extensions.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

use veneer_core::{HandlerMeta, RequestId};
use veneer_telemetry::ArgCapture;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use veneer_middleware::context::MiddlewareContext;
/// use veneer_core::HandlerMeta;
///
/// struct UserController;
///
/// let ctx = MiddlewareContext::new().with_handler(HandlerMeta::of::<UserController>("find"));
/// assert_eq!(ctx.handler().map(|h| h.class_name()), Some("UserController"));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    handler: Option<HandlerMeta>,
    started_at: Instant,
    captured_args: ArgCapture,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            handler: None,
            started_at: Instant::now(),
            captured_args: ArgCapture::new(),
            extensions: HashMap::new(),
        }
    }

    /// Binds the handler the request is dispatched to.
    #[must_use]
    pub fn with_handler(mut self, handler: HandlerMeta) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    ///
    /// This should only be called by the RequestId middleware.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the handler, if the request was routed.
    #[must_use]
    pub fn handler(&self) -> Option<HandlerMeta> {
        self.handler
    }

    /// Returns the arguments captured for the web instrumentation.
    ///
    /// The handle is shared: clones record into the same list.
    #[must_use]
    pub fn captured_args(&self) -> &ArgCapture {
        &self.captured_args
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
