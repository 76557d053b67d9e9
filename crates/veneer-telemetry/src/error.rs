//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur during telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A timestamp pattern chrono cannot format with.
    #[error("Invalid time pattern: {0}")]
    InvalidPattern(String),

    /// A sink could not accept a record.
    #[error("Sink rejected record: {0}")]
    Sink(String),
}
