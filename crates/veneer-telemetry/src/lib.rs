//! Logging and instrumentation records for Veneer.
//!
//! - [`logging`] - global `tracing` subscriber setup
//! - [`record`] - [`LogRecord`] for generic instrumented calls and
//!   [`WebLogRecord`] for handler invocations
//! - [`capture`] - argument capture keyed by short type name
//! - [`timing`] - formatted timestamps and monotonic elapsed time
//! - [`sink`] - pluggable record consumers and failure-isolating delivery
//!
//! # Example
//!
//! ```rust
//! use veneer_telemetry::{deliver, Args, CallSite, LogRecord, TracingSink};
//!
//! struct UserService;
//!
//! let site = CallSite::of::<UserService>("find").description("find a user");
//! let record = LogRecord::failure(&site, Args::new().arg(&1_i64).to_params(), "not found".into());
//! deliver(&TracingSink, &record);
//! ```

#![doc(html_root_url = "https://docs.rs/veneer-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod capture;
pub mod error;
pub mod logging;
pub mod record;
pub mod sink;
pub mod timing;

pub use capture::{ArgCapture, Args, CapturedArg, Params};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use record::{CallSite, LogRecord, WebLogRecord};
pub use sink::{deliver, ChannelSink, LogSink, TracingSink};
pub use timing::{Stopwatch, TimePattern, Timing, DEFAULT_TIME_PATTERN};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
