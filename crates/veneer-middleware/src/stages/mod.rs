//! Core middleware stages.
//!
//! 1. [`request_id`] - Generate/propagate request ID
//! 2. [`envelope`] - Success/error envelope
//! 3. [`error_normalization`] - Error classification
//! 4. [`flow_limit`] - In-flight request limit
//! 5. application extensions
//! 6. [`web_log`] - Handler instrumentation

pub mod envelope;
pub mod error_normalization;
pub mod flow_limit;
pub mod request_id;
pub mod web_log;

pub use envelope::{EnvelopeConfigError, ResponseEnvelopeMiddleware};
pub use error_normalization::ErrorNormalizationMiddleware;
pub use flow_limit::FlowLimitMiddleware;
pub use request_id::RequestIdMiddleware;
pub use web_log::WebLogMiddleware;
