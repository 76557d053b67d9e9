//! Error normalization middleware.
//!
//! Converts every [`PipelineError`] that reaches it into a reply carrying a
//! classified [`ErrorRecord`], so no error leaves the pipeline unclassified.
//!
//! | Error                          | Status | Code          | Message                                  |
//! |--------------------------------|--------|---------------|------------------------------------------|
//! | `Business`                     | 500    | its own       | its own, else catalog, else default      |
//! | `Param`                        | 400    | its own       | its own, else catalog, else default      |
//! | `Validation` with violations   | 400    | `VALIDATION`  | first violation (catalog override)       |
//! | `Validation` without           | 400    | `VALIDATION`  | its own                                  |
//! | `System`                       | 500    | `SYSTEM`      | its own, else the error's type name      |

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Outcome, Reply, Request};
use http::StatusCode;
use veneer_core::{
    ErrorRecord, MessageSource, PipelineError, MESSAGE_NOT_DEFINED, SYSTEM, VALIDATION,
};

/// Error normalization middleware.
#[derive(Clone)]
pub struct ErrorNormalizationMiddleware {
    catalog: Arc<dyn MessageSource>,
}

impl std::fmt::Debug for ErrorNormalizationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorNormalizationMiddleware").finish_non_exhaustive()
    }
}

impl ErrorNormalizationMiddleware {
    /// Creates the middleware over a message catalog.
    pub fn new(catalog: Arc<dyn MessageSource>) -> Self {
        Self { catalog }
    }

    /// Classifies one error.
    pub fn normalize(&self, err: PipelineError) -> (StatusCode, ErrorRecord) {
        match err {
            PipelineError::Business(mut record) => {
                record.resolve_message(self.catalog.as_ref());
                tracing::error!(
                    error.code = %record.code,
                    message = %record.message,
                    trace = ?record.trace,
                    "business error"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, record)
            }
            PipelineError::Param(mut record) => {
                record.resolve_message(self.catalog.as_ref());
                tracing::warn!(error.code = %record.code, message = %record.message, "parameter error");
                (StatusCode::BAD_REQUEST, record)
            }
            PipelineError::Validation { violations, .. } if !violations.is_empty() => {
                let first = &violations[0].message;
                let message = self
                    .catalog
                    .message(first)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| first.clone());
                tracing::warn!(
                    path = %violations[0].path,
                    message = %message,
                    violations = violations.len(),
                    "validation failed"
                );
                (StatusCode::BAD_REQUEST, ErrorRecord::new(VALIDATION, message))
            }
            PipelineError::Validation { message, .. } => {
                let message = if message.trim().is_empty() {
                    MESSAGE_NOT_DEFINED.to_string()
                } else {
                    message
                };
                tracing::warn!(message = %message, "validation failed");
                (StatusCode::BAD_REQUEST, ErrorRecord::new(VALIDATION, message))
            }
            PipelineError::System { type_name, message } => {
                let message = message.unwrap_or_else(|| type_name.clone());
                tracing::error!(error.type_name = %type_name, message = %message, "system error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorRecord::new(SYSTEM, message))
            }
        }
    }
}

impl Middleware for ErrorNormalizationMiddleware {
    fn name(&self) -> &'static str {
        "error_normalization"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            match next.run(ctx, request).await {
                Ok(reply) => Ok(reply),
                Err(err) => {
                    let (status, record) = self.normalize(err);
                    Ok(Reply::error(status, record))
                }
            }
        })
    }
}
