//! # Veneer Test
//!
//! In-memory testing for Veneer applications. Requests go through routing
//! and the full pipeline without binding a port.
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use veneer_config::VeneerConfig;
//! use veneer_core::{HandlerMeta, PipelineError};
//! use veneer_server::{App, Call};
//! use veneer_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let mut config = VeneerConfig::default();
//! config.web.result.packages = vec!["ping".into()];
//! let app = App::builder(config)
//!     .get("/ping", HandlerMeta::named("ping::PingController", "ping"), |_call: Call| async {
//!         Ok::<_, PipelineError>("pong")
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = TestClient::new(app).get("/ping").send().await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.data::<String>().unwrap(), "pong");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/veneer-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
