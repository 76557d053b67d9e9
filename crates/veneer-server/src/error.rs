//! Server error types.

use thiserror::Error;
use veneer_config::ConfigError;
use veneer_middleware::stages::EnvelopeConfigError;

/// Errors raised while assembling or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Accepting or serving a connection failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The response enveloper could not be configured.
    #[error(transparent)]
    Envelope(#[from] EnvelopeConfigError),

    /// Two routes share a method and template.
    #[error("duplicate route {method} {path}")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Path template.
        path: String,
    },
}

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
