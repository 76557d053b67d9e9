//! Operational logging.
//!
//! Installs one global `tracing` subscriber. Instrumentation records reach it
//! through [`TracingSink`](crate::TracingSink); everything else in the
//! pipeline logs with the `tracing` macros directly.
//!
//! ```rust,no_run
//! use veneer_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig {
//!     level: "info,veneer_middleware=debug".into(),
//!     ..LogConfig::default()
//! })?;
//! # Ok::<(), veneer_telemetry::TelemetryError>(())
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Environment variable that overrides [`LogConfig::level`] when set.
pub const FILTER_ENV: &str = "RUST_LOG";

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install the subscriber at all.
    pub enabled: bool,
    /// Filter directive, e.g. `info` or `veneer_server=debug,info`.
    pub level: String,
    /// JSON lines instead of compact text.
    pub json_format: bool,
    /// Print source file and line.
    pub with_location: bool,
    /// Logged once at startup to tag the process.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: false,
            with_location: false,
            service_name: "veneer".to_string(),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// A non-empty `RUST_LOG` takes precedence over `config.level`.
///
/// # Errors
///
/// Returns [`TelemetryError::LoggingInit`] when the filter does not parse or
/// another global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let directive = std::env::var(FILTER_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone());
    let filter = parse_filter(&directive)?;

    tracing_subscriber::registry()
        .with(output_layer(config).with_filter(filter))
        .try_init()
        .map_err(|err| TelemetryError::LoggingInit(err.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        filter = %directive,
        json = config.json_format,
        "logging initialized"
    );
    Ok(())
}

fn output_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_file(config.with_location)
        .with_line_number(config.with_location);
    if config.json_format {
        layer.json().flatten_event(true).boxed()
    } else {
        layer.compact().boxed()
    }
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::LoggingInit`] naming the bad directive.
pub fn parse_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|err| TelemetryError::LoggingInit(format!("invalid filter {directive:?}: {err}")))
}
