//! Typed configuration for Veneer.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use veneer_config::{ConfigLoader, VeneerConfig};
//!
//! # fn main() -> Result<(), veneer_config::ConfigError> {
//! let config: VeneerConfig = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("config/veneer.toml")?
//!     .with_env_prefix("VENEER")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! json_format = false
//!
//! [aspect]
//! enabled = true
//! time_pattern = "%Y-%m-%d %H:%M:%S:%3f"
//!
//! [web.result]
//! enabled = true
//! packages = ["user_service::controller"]
//!
//! [web.advice]
//! enabled = true
//!
//! [web.log]
//! enabled = true
//!
//! [web.resolver.json]
//! enabled = true
//!
//! [web.info]
//! enabled = true
//! path = "/info"
//! params = { version = "1.0.0" }
//!
//! [web.flow_limit]
//! enabled = false
//! max_concurrent = 256
//!
//! [messages]
//! USER_1001 = "user already exists"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `VENEER__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `VENEER__LOGGING__LEVEL=debug`
//! - `VENEER__WEB__RESULT__PACKAGES=app::controller,app::admin`
//! - `VENEER__MESSAGES__USER_1001=user already exists`

#![doc(html_root_url = "https://docs.rs/veneer-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
