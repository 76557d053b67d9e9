//! # Veneer Server
//!
//! Routing, handler dispatch and the HTTP listener for the Veneer pipeline.
//!
//! - [`App`] - routes plus the pipeline assembled from a `VeneerConfig`
//! - [`Call`] / [`Handler`] - handler arguments and async handlers
//! - [`Router`] - `{param}` path templates
//! - [`Server`] - hyper HTTP/1.1 listener with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use veneer_config::VeneerConfig;
//! use veneer_core::{HandlerMeta, PipelineError};
//! use veneer_extract::Path;
//! use veneer_server::{App, Call};
//!
//! mod controller {
//!     pub struct UserController;
//! }
//!
//! let mut config = VeneerConfig::default();
//! config.web.result.packages = vec!["user_service::controller".into()];
//!
//! let app = App::builder(config)
//!     .get(
//!         "/user/{id}",
//!         HandlerMeta::of::<controller::UserController>("find"),
//!         |call: Call| async move {
//!             let Path(id) = call.extract::<Path<i64>>()?;
//!             Ok::<_, PipelineError>(id)
//!         },
//!     )
//!     .build()
//!     .unwrap();
//! assert_eq!(app.routes().next(), Some((&Method::GET, "/user/{id}")));
//! ```

#![doc(html_root_url = "https://docs.rs/veneer-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
mod error;
pub mod handler;
pub mod info;
pub mod router;
pub mod server;
pub mod shutdown;

pub use app::{App, AppBuilder, NOT_FOUND_CODE};
pub use error::{ServerError, ServerResult};
pub use handler::{BoxedHandler, Call, CaptureArg, Handler};
pub use router::{RouteMatch, Router};
pub use server::Server;
pub use shutdown::{ConnectionTracker, ShutdownSignal};
