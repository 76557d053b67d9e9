//! Handler arguments and dispatch.
//!
//! A handler is any async closure taking a [`Call`] and returning
//! `Result<R, PipelineError>` with `R: Serialize`. Arguments are pulled out of
//! the call explicitly; every argument pulled through [`Call::extract`],
//! [`Call::json`] or [`Call::body`] is recorded for the web log unless it is
//! marked ignored.
//!
//! ```rust
//! use veneer_core::PipelineError;
//! use veneer_extract::{JsonParam, Path};
//! use veneer_server::handler::{Call, Handler};
//!
//! async fn find(call: Call) -> Result<i64, PipelineError> {
//!     let Path(id) = call.extract::<Path<i64>>()?;
//!     Ok(id)
//! }
//!
//! fn assert_handler<H: Handler>(_: H) {}
//! assert_handler(find);
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use veneer_core::{short_type_name, ErrorRecord, HandlerMeta, PipelineError, RequestId, PARAM_ERROR};
use veneer_extract::{ExtractionContext, FromRequest, JsonParam, LogIgnore, Path, Query};
use veneer_middleware::{BoxFuture, Instrumentation, Outcome, Reply};
use veneer_telemetry::{ArgCapture, CapturedArg, TimePattern, TracingSink};

/// Per-request argument accessor handed to a handler.
#[derive(Debug, Clone)]
pub struct Call {
    request: ExtractionContext,
    captured: ArgCapture,
    resolver_enabled: bool,
    request_id: RequestId,
    handler: HandlerMeta,
    instrumentation: Instrumentation,
}

impl Call {
    /// Creates a call over one request.
    ///
    /// `captured` should be the capture the web log stage reads. The call
    /// starts with an enabled `tracing` instrumentation; an app replaces it
    /// with its own through [`with_instrumentation`](Self::with_instrumentation).
    #[must_use]
    pub fn new(
        request: ExtractionContext,
        captured: ArgCapture,
        resolver_enabled: bool,
        request_id: RequestId,
        handler: HandlerMeta,
    ) -> Self {
        Self {
            request,
            captured,
            resolver_enabled,
            request_id,
            handler,
            instrumentation: Instrumentation::new(Arc::new(TracingSink), TimePattern::default()),
        }
    }

    /// Replaces the generic instrumentation handed to the handler.
    #[must_use]
    pub fn with_instrumentation(mut self, instrumentation: Instrumentation) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    /// Returns the app's generic instrumentation.
    #[must_use]
    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    /// Returns the request id assigned by the pipeline.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the handler being invoked.
    #[must_use]
    pub fn handler(&self) -> HandlerMeta {
        self.handler
    }

    /// Returns the raw request view.
    #[must_use]
    pub fn request(&self) -> &ExtractionContext {
        &self.request
    }

    /// Extracts a typed argument and records it.
    pub fn extract<E: FromRequest + CaptureArg>(&self) -> Result<E, PipelineError> {
        let value = E::from_request(&self.request)?;
        if let Some(arg) = value.capture() {
            self.captured.record(arg);
        }
        Ok(value)
    }

    /// Resolves a JSON query parameter and records it unless ignored.
    ///
    /// With the JSON resolver disabled the parameter is treated as absent.
    pub fn json<T>(&self, param: &JsonParam) -> Result<Option<T>, PipelineError>
    where
        T: DeserializeOwned + Serialize,
    {
        let value = if self.resolver_enabled {
            param.resolve::<T>(&self.request)?
        } else {
            param.decode::<T>(None)?
        };
        if let (Some(value), false) = (&value, param.is_log_ignored()) {
            self.captured.record_value(value);
        }
        Ok(value)
    }

    /// Deserializes the JSON request body and records it.
    pub fn body<T>(&self) -> Result<T, PipelineError>
    where
        T: DeserializeOwned + Serialize,
    {
        let value: T = serde_json::from_slice(self.request.body()).map_err(|err| {
            PipelineError::Param(ErrorRecord::new(
                PARAM_ERROR,
                format!("invalid {} body: {err}", short_type_name::<T>()),
            ))
        })?;
        self.captured.record_value(&value);
        Ok(value)
    }
}

/// How an extracted argument shows up in the web log.
pub trait CaptureArg {
    /// Returns the captured form, or `None` to leave it out.
    fn capture(&self) -> Option<CapturedArg>;
}

impl<T: Serialize> CaptureArg for Path<T> {
    fn capture(&self) -> Option<CapturedArg> {
        Some(CapturedArg::of(&self.0))
    }
}

impl<T: Serialize> CaptureArg for Query<T> {
    fn capture(&self) -> Option<CapturedArg> {
        Some(CapturedArg::of(&self.0))
    }
}

impl<E> CaptureArg for LogIgnore<E> {
    fn capture(&self) -> Option<CapturedArg> {
        None
    }
}

impl<E: CaptureArg> CaptureArg for Option<E> {
    fn capture(&self) -> Option<CapturedArg> {
        self.as_ref().and_then(CaptureArg::capture)
    }
}

/// An async request handler.
pub trait Handler: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, call: Call) -> BoxFuture<'static, Outcome>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Call) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, PipelineError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    fn call(&self, call: Call) -> BoxFuture<'static, Outcome> {
        let fut = self(call);
        Box::pin(async move { fut.await.and_then(Reply::from_value) })
    }
}

/// A type-erased, shareable handler.
pub type BoxedHandler = Arc<dyn Handler>;
