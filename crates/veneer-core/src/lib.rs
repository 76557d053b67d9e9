//! # Veneer Core
//!
//! Error model and shared types for the Veneer request pipeline.
//!
//! - [`PipelineError`] - the four-way error taxonomy handlers fail with
//! - [`ErrorRecord`] / [`ServiceCallInfo`] - classified error with hop trace
//! - [`MessageCatalog`] / [`MessageSource`] - code to message lookup
//! - [`Envelope`] - the `{code, message, data}` wire body
//! - [`ProviderBoundary`] - error enrichment at RPC provider boundaries
//! - [`RequestId`] / [`HandlerMeta`] - request and handler identity

#![doc(html_root_url = "https://docs.rs/veneer-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catalog;
mod context;
mod envelope;
mod error;
pub mod rpc;

pub use catalog::{MessageCatalog, MessageSource};
pub use context::{short_name, short_type_name, HandlerMeta, RequestId};
pub use envelope::{Envelope, SUCCESS_CODE, UNCAUGHT_ERROR_CODE};
pub use error::{
    ErrorRecord, PipelineError, PipelineResult, ServiceCallInfo, Violation, MESSAGE_NOT_DEFINED,
    PANIC_TYPE, PARAM_ERROR, SYSTEM, VALIDATION,
};
pub use rpc::ProviderBoundary;
