//! # Veneer Extract
//!
//! Handler argument extraction for the Veneer pipeline.
//!
//! - [`ExtractionContext`] - read access to one request
//! - [`FromRequest`] - typed extractors: [`Path`], [`Query`], [`LogIgnore`]
//! - [`JsonParam`] - a query parameter carrying a JSON document
//! - [`pattern`] - date/time patterns for timestamps inside JSON parameters

#![doc(html_root_url = "https://docs.rs/veneer-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod extractor;
mod json_param;
mod path;
pub mod pattern;
mod query;

pub use context::{ExtractionContext, ExtractionContextBuilder, PathParams};
pub use error::{ExtractionError, ExtractionSource};
pub use extractor::{FromRequest, LogIgnore};
pub use json_param::JsonParam;
pub use path::Path;
pub use pattern::{DatePattern, DEFAULT_DATE_PATTERN};
pub use query::Query;
