//! Extraction error types.

use http::StatusCode;
use std::fmt;
use veneer_core::{ErrorRecord, PipelineError, PARAM_ERROR};

/// Where data was being extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path parameters (e.g., `/user/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// A parameter declaration (e.g., its date pattern)
    Declaration,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Declaration => write!(f, "declaration"),
        }
    }
}

/// Error that occurs during extraction.
///
/// Converts into [`PipelineError::Param`] for request data problems and into
/// [`PipelineError::System`] for declaration problems.
///
/// # Example
///
/// ```rust
/// use veneer_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::missing(ExtractionSource::Path, "id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert!(err.to_string().contains("id"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    Missing,
    InvalidType,
    DeserializationFailed,
    InvalidPattern,
}

impl ExtractionError {
    /// Creates an error for a missing field or parameter.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required {source} parameter: {field}"),
            field: Some(field),
        }
    }

    /// Creates an error for an invalid type or format.
    #[must_use]
    pub fn invalid_type(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for deserialization failure.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to deserialize {source}: {error}"),
            field: None,
        }
    }

    /// Creates an error for an unusable date/time pattern.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self {
            extraction_source: ExtractionSource::Declaration,
            kind: ExtractionErrorKind::InvalidPattern,
            message: format!("invalid date-time pattern '{pattern}'"),
            field: Some(pattern),
        }
    }

    /// Returns the extraction source.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the HTTP status this error surfaces with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::Missing
            | ExtractionErrorKind::InvalidType
            | ExtractionErrorKind::DeserializationFailed => StatusCode::BAD_REQUEST,
            ExtractionErrorKind::InvalidPattern => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

impl From<ExtractionError> for PipelineError {
    fn from(err: ExtractionError) -> Self {
        match err.kind {
            ExtractionErrorKind::InvalidPattern => Self::system(&err),
            _ => Self::Param(ErrorRecord::new(PARAM_ERROR, err.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = ExtractionError::missing(ExtractionSource::Path, "id");
        assert_eq!(err.extraction_source(), ExtractionSource::Path);
        assert_eq!(err.field(), Some("id"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_request_errors_become_param_errors() {
        let err: PipelineError =
            ExtractionError::invalid_type(ExtractionSource::Path, "id", "expected i64").into();
        match err {
            PipelineError::Param(record) => {
                assert_eq!(record.code, PARAM_ERROR);
                assert!(record.message.contains("expected i64"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pattern_errors_become_system_errors() {
        let err: PipelineError = ExtractionError::invalid_pattern("%Q").into();
        assert!(matches!(err, PipelineError::System { .. }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
