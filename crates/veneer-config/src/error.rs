//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded or was rejected.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The named file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A file extension other than `.toml` or `.json`.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A dotted key such as `aspect.time_pattern` holds an unusable value.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted key.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A key the pipeline cannot start without.
    #[error("{field} must be set")]
    MissingField {
        /// Dotted key.
        field: String,
    },

    /// A `VENEER__*` override that does not parse.
    #[error("environment override {var}: {reason}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// Expected shape.
        reason: String,
    },

    /// Any other rejected configuration.
    #[error("configuration rejected: {0}")]
    Validation(String),
}

impl ConfigError {
    /// [`FileNotFound`](Self::FileNotFound) for `path`.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// [`Read`](Self::Read) for `path`.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// [`InvalidValue`](Self::InvalidValue) for a dotted key.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// [`MissingField`](Self::MissingField) for a dotted key.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// [`EnvParse`](Self::EnvParse) for an environment variable.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// [`Validation`](Self::Validation) with a free-form message.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the dotted key the error is about, if it names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } | Self::MissingField { field } => Some(field),
            _ => None,
        }
    }
}
