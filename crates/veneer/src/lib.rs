//! # Veneer
//!
//! A JSON web-request pipeline: every handler reply is wrapped in a uniform
//! `{code, message, data}` envelope, every error is classified into one, and
//! handler arguments may arrive as JSON documents inside query parameters.
//!
//! - JSON query parameters resolved into typed arguments
//! - Web and generic instrumentation records with timing
//! - Ordered error normalization backed by a message catalog
//! - Response enveloping scoped by module path
//! - Service-call trace enrichment at RPC provider boundaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use veneer::prelude::*;
//!
//! mod controller {
//!     pub struct UserController;
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new()
//!         .with_defaults()
//!         .with_file("config/veneer.toml")?
//!         .with_env_prefix("VENEER")
//!         .load()?;
//!     init_logging(&config.logging.to_log_config())?;
//!
//!     let app = App::builder(config.clone())
//!         .get(
//!             "/user/{id}",
//!             HandlerMeta::of::<controller::UserController>("find"),
//!             |call: Call| async move {
//!                 let Path(id) = call.extract::<Path<i64>>()?;
//!                 Ok::<_, PipelineError>(id)
//!             },
//!         )
//!         .build()?;
//!
//!     Server::new(std::sync::Arc::new(app), &config.server).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → ResponseEnvelope → ErrorNormalization → FlowLimit → [Extension] → WebLog → Handler
//!                                                                                                    ↓
//! Response ← JSON ←──── envelope ←──────── classify ←─────────────────────────────────── record ←────┘
//! ```

#![doc(html_root_url = "https://docs.rs/veneer/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use veneer_config as config;
pub use veneer_core as core;
pub use veneer_extract as extract;
pub use veneer_middleware as middleware;
pub use veneer_server as server;
pub use veneer_telemetry as telemetry;

/// Common imports.
///
/// ```rust
/// use veneer::prelude::*;
///
/// let envelope = Envelope::error("USER_1001", "user exists");
/// assert!(!envelope.is_success());
/// ```
pub mod prelude {
    pub use veneer_config::{ConfigError, ConfigLoader, VeneerConfig};
    pub use veneer_core::{
        Envelope, ErrorRecord, HandlerMeta, MessageCatalog, MessageSource, PipelineError,
        ProviderBoundary, RequestId, ServiceCallInfo, Violation, PARAM_ERROR, SUCCESS_CODE,
    };
    pub use veneer_extract::{JsonParam, LogIgnore, Path, Query};
    pub use veneer_middleware::{
        FnMiddleware, Instrumentation, Middleware, MiddlewareContext, Next, Outcome, Reply,
    };
    pub use veneer_server::{App, AppBuilder, Call, Handler, Server, ServerError, ShutdownSignal};
    pub use veneer_telemetry::{init_logging, Args, CallSite, LogConfig, LogSink, TracingSink};
}
