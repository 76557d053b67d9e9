//! Error enrichment at RPC provider boundaries.
//!
//! A service that is called over RPC wraps each provider method in a
//! [`ProviderBoundary`]. Errors leaving the method get their message
//! backfilled and one [`ServiceCallInfo`] hop appended, so the client at the
//! end of the call chain sees every service the error passed through.

use std::future::Future;
use std::sync::Arc;

use crate::catalog::MessageSource;
use crate::error::{ErrorRecord, PipelineError, ServiceCallInfo};

/// Message used when a violation has no catalog entry.
pub const VALIDATION_MESSAGE_NOT_SET: &str = "validation message not set";

/// Enriches errors raised by one provider method.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use veneer_core::{MessageCatalog, PipelineError, ProviderBoundary, ServiceCallInfo};
///
/// let boundary = ProviderBoundary::new(
///     ServiceCallInfo::new("10.0.0.7:20880", "user-service", "UserApi", "find"),
///     Arc::new(MessageCatalog::from_entries([("USER_1001", "user already exists")])),
/// );
///
/// let err = boundary.on_error(PipelineError::business_code("USER_1001"));
/// let PipelineError::Business(record) = err else { unreachable!() };
/// assert_eq!(record.message, "user already exists");
/// assert_eq!(record.trace.len(), 1);
/// ```
#[derive(Clone)]
pub struct ProviderBoundary {
    hop: ServiceCallInfo,
    catalog: Arc<dyn MessageSource>,
}

impl std::fmt::Debug for ProviderBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBoundary")
            .field("hop", &self.hop)
            .finish_non_exhaustive()
    }
}

impl ProviderBoundary {
    /// Creates a boundary describing the local hop.
    pub fn new(hop: ServiceCallInfo, catalog: Arc<dyn MessageSource>) -> Self {
        Self { hop, catalog }
    }

    /// Returns the hop this boundary appends.
    pub fn hop(&self) -> &ServiceCallInfo {
        &self.hop
    }

    /// Enriches an error leaving the provider.
    pub fn on_error(&self, err: PipelineError) -> PipelineError {
        match err {
            PipelineError::Business(record) => PipelineError::Business(self.enrich(record)),
            PipelineError::Param(record) => PipelineError::Param(self.enrich(record)),
            PipelineError::Validation {
                violations,
                message,
            } => match violations.first() {
                Some(first) => {
                    let code = first.message.clone();
                    let message = self
                        .catalog
                        .message(&code)
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| VALIDATION_MESSAGE_NOT_SET.to_string());
                    PipelineError::Business(self.enrich(ErrorRecord::new(code, message)))
                }
                None => PipelineError::Validation {
                    violations,
                    message,
                },
            },
            other @ PipelineError::System { .. } => {
                tracing::error!(
                    hop = %self.hop,
                    error = %other,
                    "undeclared error raised by provider"
                );
                other
            }
        }
    }

    /// Runs a provider call, enriching its error.
    pub fn invoke<T, F>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> Result<T, PipelineError>,
    {
        f().map_err(|err| self.on_error(err))
    }

    /// Awaits a provider call, enriching its error.
    pub async fn invoke_async<T, Fut>(&self, fut: Fut) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        fut.await.map_err(|err| self.on_error(err))
    }

    fn enrich(&self, mut record: ErrorRecord) -> ErrorRecord {
        record.resolve_message(self.catalog.as_ref());
        record.record_hop(self.hop.clone());
        tracing::error!(
            code = %record.code,
            message = %record.message,
            trace = ?record.trace,
            "provider raised a business error"
        );
        record
    }
}
