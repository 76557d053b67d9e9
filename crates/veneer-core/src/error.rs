//! Error model for the Veneer pipeline.
//!
//! Every failure that reaches the client is classified into one of four
//! [`PipelineError`] variants. The classified form that travels on the wire is
//! an [`ErrorRecord`]: a code, a human message, and the hop-by-hop
//! [`ServiceCallInfo`] trace of the services it passed through.
//!
//! | Variant | HTTP status | Wire code |
//! |---|---|---|
//! | `Param` | 400 | record code (`PARAM_ERROR`) |
//! | `Validation` | 400 | `VALIDATION` |
//! | `Business` | 500 | record code |
//! | `System` | 500 | `SYSTEM` |

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::MessageSource;

/// Result type alias using [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Code used when a required bound parameter is missing or malformed.
pub const PARAM_ERROR: &str = "PARAM_ERROR";

/// Code used for validation failures.
pub const VALIDATION: &str = "VALIDATION";

/// Code used for unclassified failures.
pub const SYSTEM: &str = "SYSTEM";

/// Type name reported for a handler that panicked.
pub const PANIC_TYPE: &str = "panic";

/// Message used when neither the error nor the catalog supplies one.
pub const MESSAGE_NOT_DEFINED: &str = "message not defined";

/// One processing hop an error passed through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCallInfo {
    /// Local address of the hop (host:port).
    pub address: String,
    /// Application name of the hop.
    pub app_name: String,
    /// Interface (service type) name.
    pub inter_name: String,
    /// Method name invoked on the interface.
    pub method_name: String,
}

impl ServiceCallInfo {
    /// Creates a hop description.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        app_name: impl Into<String>,
        inter_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            app_name: app_name.into(),
            inter_name: inter_name.into(),
            method_name: method_name.into(),
        }
    }
}

impl fmt::Display for ServiceCallInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} {}#{}",
            self.app_name, self.address, self.inter_name, self.method_name
        )
    }
}

/// A classified failure: code, message and hop trace.
///
/// The message may be blank until it is resolved against a
/// [`MessageSource`]; see [`ErrorRecord::resolve_message`].
///
/// # Example
///
/// ```
/// use veneer_core::{ErrorRecord, MessageCatalog};
///
/// let catalog = MessageCatalog::from_entries([("USER_1001", "user already exists")]);
/// let mut record = ErrorRecord::with_code("USER_1001");
/// record.resolve_message(&catalog);
/// assert_eq!(record.message, "user already exists");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Stable identifier, also the catalog key.
    pub code: String,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
    /// Hops this error travelled, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<ServiceCallInfo>,
}

impl ErrorRecord {
    /// Creates a record with an explicit message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Creates a record whose message is left for the catalog to fill.
    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        Self::new(code, String::new())
    }

    /// Returns `true` if the message is empty or whitespace.
    #[must_use]
    pub fn is_message_blank(&self) -> bool {
        self.message.trim().is_empty()
    }

    /// Fills a blank message from `source` by code.
    ///
    /// Falls back to [`MESSAGE_NOT_DEFINED`]. A non-blank message is kept.
    pub fn resolve_message(&mut self, source: &dyn MessageSource) {
        if self.is_message_blank() {
            self.message = source.message_or_default(&self.code);
        }
    }

    /// Appends one hop to the trace.
    pub fn record_hop(&mut self, hop: ServiceCallInfo) {
        self.trace.push(hop);
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        for hop in &self.trace {
            write!(f, " <- {hop}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorRecord {}

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path of the offending value (e.g. `user.name`).
    pub path: String,
    /// Violation message. May itself be a catalog key.
    pub message: String,
}

impl Violation {
    /// Creates a violation.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The error taxonomy every handler failure is expressed in.
///
/// # Example
///
/// ```
/// use veneer_core::PipelineError;
/// use http::StatusCode;
///
/// let err = PipelineError::business("USER_1002", "user id must be present");
/// assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A bound argument was missing or malformed.
    #[error("parameter error: {0}")]
    Param(ErrorRecord),

    /// Constraint validation failed.
    ///
    /// An empty `violations` list marks a generic validation failure that
    /// only carries `message`.
    #[error("validation failed: {message}")]
    Validation {
        /// Individual violations, in detection order.
        violations: Vec<Violation>,
        /// The failure's own message.
        message: String,
    },

    /// Raised explicitly by application code with a code.
    #[error("business error: {0}")]
    Business(ErrorRecord),

    /// Anything else.
    #[error("{}", .message.as_deref().unwrap_or(.type_name.as_str()))]
    System {
        /// Fully qualified type name of the original error.
        type_name: String,
        /// The original error's message, if it had one.
        message: Option<String>,
    },
}

impl PipelineError {
    /// Creates a business error with an explicit message.
    #[must_use]
    pub fn business(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Business(ErrorRecord::new(code, message))
    }

    /// Creates a business error whose message is resolved from the catalog.
    #[must_use]
    pub fn business_code(code: impl Into<String>) -> Self {
        Self::Business(ErrorRecord::with_code(code))
    }

    /// Creates a `PARAM_ERROR` for a required argument of type `type_name`.
    #[must_use]
    pub fn param_required(type_name: &str) -> Self {
        Self::Param(ErrorRecord::new(
            PARAM_ERROR,
            format!("param {type_name} is required"),
        ))
    }

    /// Creates a validation failure from individual violations.
    #[must_use]
    pub fn violations(violations: Vec<Violation>) -> Self {
        let message = violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect::<Vec<_>>()
            .join(", ");
        Self::Validation {
            violations,
            message,
        }
    }

    /// Creates a generic validation failure without structured violations.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            violations: Vec::new(),
            message: message.into(),
        }
    }

    /// Classifies an arbitrary error as a system failure.
    ///
    /// An empty display string is treated as "no message" so the type name is
    /// reported instead.
    #[must_use]
    pub fn system<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let message = err.to_string();
        Self::System {
            type_name: std::any::type_name::<E>().to_string(),
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    /// Classifies a caught panic as a system failure.
    ///
    /// String payloads become the message; anything else leaves it empty.
    #[must_use]
    pub fn panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned());
        Self::System {
            type_name: PANIC_TYPE.to_string(),
            message,
        }
    }

    /// Returns the HTTP status this error terminates the request with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Param(_) | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Business(_) | Self::System { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the wire code this error surfaces with when it is not
    /// normalized any further.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Param(record) | Self::Business(record) => &record.code,
            Self::Validation { .. } => VALIDATION,
            Self::System { .. } => SYSTEM,
        }
    }

    /// Returns a short tag for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Param(_) => "param",
            Self::Validation { .. } => "validation",
            Self::Business(_) => "business",
            Self::System { .. } => "system",
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::system(&err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::system(&err)
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        // A wrapped PipelineError keeps its classification.
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(err) => {
                let message = err.to_string();
                Self::System {
                    type_name: std::any::type_name::<anyhow::Error>().to_string(),
                    message: (!message.trim().is_empty()).then_some(message),
                }
            }
        }
    }
}
