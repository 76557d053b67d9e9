//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use veneer_telemetry::{LogConfig, DEFAULT_TIME_PATTERN};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use veneer_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     shutdown_timeout_secs: 10,
/// };
/// assert_eq!(config.socket_addr().unwrap().port(), 8080);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Parses the bind address.
    pub fn socket_addr(&self) -> Option<std::net::SocketAddr> {
        self.http_addr.parse().ok()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Operational logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install the global subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `veneer=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json_format: bool,

    /// Service name attached to log output.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl LoggingConfig {
    /// Converts the section into the subscriber settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.json_format,
            service_name: self.service_name.clone(),
            ..LogConfig::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            json_format: false,
            service_name: default_service_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "veneer".to_string()
}

/// Generic method instrumentation section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AspectConfig {
    /// Record marked calls.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// chrono strftime pattern for record timestamps.
    #[serde(default = "default_time_pattern")]
    pub time_pattern: String,
}

impl Default for AspectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time_pattern: default_time_pattern(),
        }
    }
}

fn default_time_pattern() -> String {
    DEFAULT_TIME_PATTERN.to_string()
}

/// Switch-only section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Toggle {
    /// Whether the feature runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Response enveloping section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResultConfig {
    /// Envelope handler replies.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Module path prefixes whose handlers are enveloped.
    #[serde(default)]
    pub packages: Vec<String>,
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            packages: Vec::new(),
        }
    }
}

/// Argument resolver section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// JSON-in-query resolution.
    #[serde(default)]
    pub json: Toggle,
}

/// Info endpoint section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InfoConfig {
    /// Serve the endpoint.
    #[serde(default)]
    pub enabled: bool,

    /// Route path.
    #[serde(default = "default_info_path")]
    pub path: String,

    /// Values returned by the endpoint.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_info_path(),
            params: BTreeMap::new(),
        }
    }
}

fn default_info_path() -> String {
    "/info".to_string()
}

/// Largest accepted `web.flow_limit.max_concurrent`.
///
/// Matches the permit ceiling of `tokio::sync::Semaphore`.
pub const MAX_FLOW_LIMIT: usize = usize::MAX >> 3;

/// In-flight request limit section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FlowLimitConfig {
    /// Reject requests above the limit.
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of requests in flight.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Error code of the rejection.
    #[serde(default = "default_flow_code")]
    pub code: String,

    /// Error message of the rejection.
    #[serde(default = "default_flow_message")]
    pub message: String,
}

impl Default for FlowLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_concurrent: default_max_concurrent(),
            code: default_flow_code(),
            message: default_flow_message(),
        }
    }
}

fn default_max_concurrent() -> usize {
    256
}

fn default_flow_code() -> String {
    "FLOW_LIMITED".to_string()
}

fn default_flow_message() -> String {
    "too many requests".to_string()
}

/// Web pipeline section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    /// Response enveloping.
    #[serde(default)]
    pub result: ResultConfig,

    /// Error normalization.
    #[serde(default)]
    pub advice: Toggle,

    /// Web instrumentation.
    #[serde(default)]
    pub log: Toggle,

    /// Argument resolvers.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Info endpoint.
    #[serde(default)]
    pub info: InfoConfig,

    /// Flow limit.
    #[serde(default)]
    pub flow_limit: FlowLimitConfig,
}

fn default_true() -> bool {
    true
}
