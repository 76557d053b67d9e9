//! # Veneer Middleware
//!
//! The fixed-order request pipeline of the Veneer framework.
//!
//! ```text
//! Request → RequestId → ResponseEnvelope → ErrorNormalization → FlowLimit → [Extension] → WebLog → Handler
//!                                                                                                     ↓
//! Response ← JSON ←──── envelope ←──────── classify errors ←──────────────────────────── record ←────┘
//! ```
//!
//! | Stage | Middleware          | Purpose                                    |
//! |-------|---------------------|--------------------------------------------|
//! | 1     | Request ID          | Generate/propagate request ID (UUID v7)    |
//! | 2     | Response Envelope   | Wrap bodies in `{code, message, data}`     |
//! | 3     | Error Normalization | Classify errors into status + error record |
//! | 4     | Flow Limit          | Reject requests above the in-flight limit  |
//! | 5     | Extension           | Application stages                         |
//! | 6     | Web Log             | Record arguments, result and timing        |
//!
//! Stages exchange a typed [`Reply`]; serialization happens once, after the
//! last stage returns.
//!
//! [`aspect::Instrumentation`] provides the same recording for arbitrary
//! calls outside the request pipeline.
//!
//! ## Example
//!
//! ```
//! use veneer_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 6);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[5].name(), "web_log");
//! ```

#![doc(html_root_url = "https://docs.rs/veneer-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aspect;
pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use aspect::Instrumentation;
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, FnMiddleware, HandlerFn, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, Stage};
pub use types::{Outcome, Reply, ReplyBody, Request, Response, ResponseExt};
