//! Main configuration types.
//!
//! This module provides the top-level [`VeneerConfig`] struct and its builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use veneer_core::MessageCatalog;
use veneer_telemetry::TimePattern;

use crate::{AspectConfig, ConfigError, LoggingConfig, ServerConfig, WebConfig, MAX_FLOW_LIMIT};

/// Complete Veneer configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use veneer_config::VeneerConfig;
///
/// let config = VeneerConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.web.result.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct VeneerConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Operational logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generic method instrumentation.
    #[serde(default)]
    pub aspect: AspectConfig,

    /// Web pipeline stages.
    #[serde(default)]
    pub web: WebConfig,

    /// Message catalog entries, code to message.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
}

impl VeneerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> VeneerConfigBuilder {
        VeneerConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if:
    /// - enveloping is enabled without a non-blank package prefix
    /// - the server address does not parse
    /// - the instrumentation time pattern is invalid
    /// - the info path does not start with `/`
    /// - the flow limit is enabled with a zero limit
    /// - the flow limit exceeds [`MAX_FLOW_LIMIT`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.web.result.enabled
            && self.web.result.packages.iter().all(|p| p.trim().is_empty())
        {
            return Err(ConfigError::missing_field("web.result.packages"));
        }

        if self.server.socket_addr().is_none() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if TimePattern::new(self.aspect.time_pattern.as_str()).is_err() {
            return Err(ConfigError::invalid_value(
                "aspect.time_pattern",
                format!("invalid time pattern: {}", self.aspect.time_pattern),
            ));
        }

        if self.web.info.enabled && !self.web.info.path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "web.info.path",
                "must start with '/'",
            ));
        }

        if self.web.flow_limit.enabled && self.web.flow_limit.max_concurrent == 0 {
            return Err(ConfigError::validation_error(
                "web.flow_limit.max_concurrent must be greater than zero when the flow limit is enabled",
            ));
        }

        if self.web.flow_limit.max_concurrent > MAX_FLOW_LIMIT {
            return Err(ConfigError::invalid_value(
                "web.flow_limit.max_concurrent",
                format!("must not exceed {MAX_FLOW_LIMIT}"),
            ));
        }

        Ok(())
    }

    /// Builds the message catalog from the `messages` section.
    #[must_use]
    pub fn catalog(&self) -> MessageCatalog {
        MessageCatalog::from_entries(self.messages.clone())
    }

    /// Returns the validated instrumentation time pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an invalid pattern.
    pub fn time_pattern(&self) -> Result<TimePattern, ConfigError> {
        TimePattern::new(self.aspect.time_pattern.as_str())
            .map_err(|err| ConfigError::invalid_value("aspect.time_pattern", err.to_string()))
    }

    /// Create a development configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use veneer_config::VeneerConfig;
    ///
    /// let config = VeneerConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.json_format = false;
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use veneer_config::VeneerConfig;
    ///
    /// let config = VeneerConfig::production();
    /// assert!(config.logging.json_format);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.json_format = true;
        config
    }
}

/// Builder for [`VeneerConfig`].
#[derive(Debug, Default)]
pub struct VeneerConfigBuilder {
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
    aspect: Option<AspectConfig>,
    web: Option<WebConfig>,
    messages: BTreeMap<String, String>,
}

impl VeneerConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the instrumentation configuration.
    #[must_use]
    pub fn aspect(mut self, aspect: AspectConfig) -> Self {
        self.aspect = Some(aspect);
        self
    }

    /// Set the web pipeline configuration.
    #[must_use]
    pub fn web(mut self, web: WebConfig) -> Self {
        self.web = Some(web);
        self
    }

    /// Add one catalog message.
    #[must_use]
    pub fn message(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(code.into(), message.into());
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> VeneerConfig {
        VeneerConfig {
            server: self.server.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            aspect: self.aspect.unwrap_or_default(),
            web: self.web.unwrap_or_default(),
            messages: self.messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResultConfig;
    use veneer_core::MessageSource;

    fn valid() -> VeneerConfig {
        let mut config = VeneerConfig::default();
        config.web.result.packages = vec!["user_service::controller".into()];
        config
    }

    #[test]
    fn test_default_requires_packages() {
        let err = VeneerConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("web.result.packages"));
    }

    #[test]
    fn test_blank_packages_rejected() {
        let mut config = valid();
        config.web.result.packages = vec!["  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_packages_not_needed_when_disabled() {
        let mut config = VeneerConfig::default();
        config.web.result.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_addr_rejected() {
        let mut config = valid();
        config.server.http_addr = "not an address".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.http_addr"
        ));
    }

    #[test]
    fn test_invalid_time_pattern_rejected() {
        let mut config = valid();
        config.aspect.time_pattern = "%Y-%Q".into();
        assert!(config.validate().is_err());
        assert!(config.time_pattern().is_err());
    }

    #[test]
    fn test_info_path_needs_slash() {
        let mut config = valid();
        config.web.info.enabled = true;
        config.web.info.path = "info".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_flow_limit_rejected() {
        let mut config = valid();
        config.web.flow_limit.enabled = true;
        config.web.flow_limit.max_concurrent = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_oversized_flow_limit_rejected() {
        let mut config = valid();
        config.web.flow_limit.max_concurrent = MAX_FLOW_LIMIT + 1;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("web.flow_limit.max_concurrent"));

        config.web.flow_limit.max_concurrent = MAX_FLOW_LIMIT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_catalog() {
        let config = VeneerConfig::builder()
            .web(WebConfig {
                result: ResultConfig {
                    enabled: true,
                    packages: vec!["app".into()],
                },
                ..WebConfig::default()
            })
            .message("USER_1001", "user already exists")
            .build();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.catalog().message("USER_1001").as_deref(),
            Some("user already exists")
        );
    }
}
