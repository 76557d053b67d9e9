//! Response envelope middleware.
//!
//! Rewrites the reply of every handler declared under one of the configured
//! module prefixes into the `{code, message, data}` envelope:
//!
//! | Reply                         | Envelope                                   |
//! |-------------------------------|--------------------------------------------|
//! | already an envelope           | unchanged                                  |
//! | 200                           | `{"code":"0","data":<body>}`               |
//! | non-200, classified error     | `{"code":<code>,"message":<message>}`      |
//! | non-200, anything else        | `{"code":"UNCAUGHT_ERROR_CODE","message":<json body>}` |

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Outcome, Reply, ReplyBody, Request};
use http::StatusCode;
use thiserror::Error;
use veneer_core::{Envelope, HandlerMeta, UNCAUGHT_ERROR_CODE};

/// Invalid envelope configuration, reported at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeConfigError {
    /// No usable module prefix was configured.
    #[error("response enveloping needs at least one non-blank module prefix")]
    NoPackages,
}

/// Middleware that wraps handler replies in an [`Envelope`].
#[derive(Debug, Clone)]
pub struct ResponseEnvelopeMiddleware {
    packages: Vec<String>,
}

impl ResponseEnvelopeMiddleware {
    /// Creates the middleware for handlers under `packages`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeConfigError::NoPackages`] when every prefix is blank.
    pub fn new<I, S>(packages: I) -> Result<Self, EnvelopeConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let packages: Vec<String> = packages
            .into_iter()
            .map(Into::into)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if packages.is_empty() {
            return Err(EnvelopeConfigError::NoPackages);
        }
        Ok(Self { packages })
    }

    /// Returns the configured prefixes.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Returns `true` when replies of `handler` are enveloped.
    pub fn applies_to(&self, handler: Option<&HandlerMeta>) -> bool {
        handler.is_some_and(|meta| {
            self.packages
                .iter()
                .any(|prefix| meta.type_path().starts_with(prefix.as_str()))
        })
    }

    /// Envelopes one reply.
    pub fn wrap(&self, handler: Option<&HandlerMeta>, reply: Reply) -> Reply {
        if !self.applies_to(handler) {
            return reply;
        }
        if matches!(reply.body(), ReplyBody::Envelope(_)) {
            return reply;
        }
        let envelope = match reply.body() {
            body if reply.status() == StatusCode::OK => Envelope::success(body.to_value()),
            ReplyBody::Error(record) => Envelope::from_record(record),
            body => Envelope::error(UNCAUGHT_ERROR_CODE, body.to_value().to_string()),
        };
        reply.with_body(ReplyBody::Envelope(envelope))
    }
}

impl Middleware for ResponseEnvelopeMiddleware {
    fn name(&self) -> &'static str {
        "response_envelope"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let handler = ctx.handler();
            let outcome = next.run(ctx, request).await;
            outcome.map(|reply| self.wrap(handler.as_ref(), reply))
        })
    }
}
