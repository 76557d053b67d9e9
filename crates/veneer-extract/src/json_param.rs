//! JSON-in-query parameter resolution.
//!
//! Some handler arguments arrive as a single query parameter whose value is a
//! JSON document, e.g. `/user/list/condition?query={"name":"kim"}`. A
//! [`JsonParam`] declares such an argument: the query name it is read from,
//! whether it is required, and the date pattern for timestamps inside it.

use serde::de::DeserializeOwned;
use veneer_core::{short_type_name, PipelineError};

use crate::pattern::{self, DatePattern};
use crate::{ExtractionContext, ExtractionError};

/// Declaration of one JSON-bound handler argument.
///
/// # Example
///
/// ```rust
/// use veneer_extract::{ExtractionContextBuilder, JsonParam};
/// use http::Uri;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct UserQuery {
///     name: String,
/// }
///
/// let ctx = ExtractionContextBuilder::new()
///     .uri(Uri::from_static("/user/list/condition?query=%7B%22name%22%3A%22kim%22%7D"))
///     .build();
///
/// let query: Option<UserQuery> = JsonParam::new("query").resolve(&ctx).unwrap();
/// assert_eq!(query.unwrap().name, "kim");
/// ```
#[derive(Debug, Clone)]
pub struct JsonParam {
    param_name: String,
    explicit_name: Option<String>,
    required: bool,
    pattern: DatePattern,
    log_ignored: bool,
}

impl JsonParam {
    /// Declares the argument named `param_name`.
    ///
    /// The query parameter has the same name unless overridden with
    /// [`name`](Self::name). Arguments are required by default.
    pub fn new(param_name: impl Into<String>) -> Self {
        Self {
            param_name: param_name.into(),
            explicit_name: None,
            required: true,
            pattern: DatePattern::default(),
            log_ignored: false,
        }
    }

    /// Reads the value from query parameter `name` instead.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.explicit_name = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Sets whether an absent or malformed value is an error.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the date/time pattern for embedded timestamps.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, ExtractionError> {
        self.pattern = DatePattern::parse(pattern.to_string())?;
        Ok(self)
    }

    /// Excludes this argument from instrumentation capture.
    pub fn log_ignore(mut self) -> Self {
        self.log_ignored = true;
        self
    }

    /// Returns the query parameter name the value is read from.
    pub fn query_name(&self) -> &str {
        self.explicit_name.as_deref().unwrap_or(&self.param_name)
    }

    /// Returns `true` if the argument is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the declared date pattern.
    pub fn date_pattern(&self) -> &DatePattern {
        &self.pattern
    }

    /// Returns `true` if the argument is excluded from capture.
    pub fn is_log_ignored(&self) -> bool {
        self.log_ignored
    }

    /// Resolves the argument from the first query value under its name.
    pub fn resolve<T: DeserializeOwned>(
        &self,
        ctx: &ExtractionContext,
    ) -> Result<Option<T>, PipelineError> {
        let raw = ctx.first_query_value(self.query_name());
        self.decode(raw.as_deref())
    }

    /// Decodes a raw query value, applying the required/optional policy.
    ///
    /// Absent, non-JSON, and JSON that does not fit `T` are all treated
    /// alike: required arguments fail with a parameter error naming `T`,
    /// optional ones resolve to `None` with a warning.
    pub fn decode<T: DeserializeOwned>(&self, raw: Option<&str>) -> Result<Option<T>, PipelineError> {
        let decoded = raw.map(|raw| {
            pattern::with_pattern(&self.pattern, || serde_json::from_str::<T>(raw))
        });

        match decoded {
            Some(Ok(value)) => Ok(Some(value)),
            outcome => {
                let reason = match outcome {
                    Some(Err(err)) => err.to_string(),
                    _ => "absent".to_string(),
                };
                if self.required {
                    tracing::debug!(
                        param = self.query_name(),
                        reason = %reason,
                        "required json param could not be resolved"
                    );
                    Err(PipelineError::param_required(short_type_name::<T>()))
                } else {
                    tracing::warn!(reason = %reason, "param [{}] is not json format", self.query_name());
                    Ok(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExtractionContextBuilder;
    use chrono::NaiveDateTime;
    use http::Uri;
    use serde::Deserialize;
    use veneer_core::PARAM_ERROR;

    #[derive(Debug, Deserialize, PartialEq)]
    struct UserQuery {
        name: String,
        #[serde(default, with = "crate::pattern::option")]
        since: Option<NaiveDateTime>,
    }

    fn ctx(uri: &'static str) -> ExtractionContext {
        ExtractionContextBuilder::new()
            .uri(Uri::from_static(uri))
            .build()
    }

    fn assert_param_error(err: PipelineError) {
        match err {
            PipelineError::Param(record) => {
                assert_eq!(record.code, PARAM_ERROR);
                assert_eq!(record.message, "param UserQuery is required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_required_absent_fails() {
        let err = JsonParam::new("query")
            .resolve::<UserQuery>(&ctx("/user/list"))
            .unwrap_err();
        assert_param_error(err);
    }

    #[test]
    fn test_required_malformed_fails() {
        let err = JsonParam::new("query")
            .resolve::<UserQuery>(&ctx("/user/list?query=%7Bname"))
            .unwrap_err();
        assert_param_error(err);
    }

    #[test]
    fn test_required_wrong_shape_fails() {
        let err = JsonParam::new("query")
            .resolve::<UserQuery>(&ctx("/user/list?query=%5B1%2C2%5D"))
            .unwrap_err();
        assert_param_error(err);
    }

    #[test]
    fn test_optional_absent_is_none() {
        let value = JsonParam::new("query")
            .required(false)
            .resolve::<UserQuery>(&ctx("/user/list"))
            .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_optional_malformed_is_none() {
        let value = JsonParam::new("query")
            .required(false)
            .resolve::<UserQuery>(&ctx("/user/list?query=not-json"))
            .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_explicit_name_overrides_param_name() {
        let param = JsonParam::new("condition").name("q");
        assert_eq!(param.query_name(), "q");
        let value = param
            .resolve::<UserQuery>(&ctx("/user/list?q=%7B%22name%22%3A%22kim%22%7D"))
            .unwrap();
        assert_eq!(value.map(|q| q.name).as_deref(), Some("kim"));
    }

    #[test]
    fn test_blank_name_keeps_param_name() {
        assert_eq!(JsonParam::new("condition").name(" ").query_name(), "condition");
    }

    #[test]
    fn test_first_value_wins() {
        let value = JsonParam::new("query")
            .resolve::<UserQuery>(&ctx(
                "/u?query=%7B%22name%22%3A%22first%22%7D&query=%7B%22name%22%3A%22second%22%7D",
            ))
            .unwrap();
        assert_eq!(value.map(|q| q.name).as_deref(), Some("first"));
    }

    #[test]
    fn test_first_value_malformed_does_not_fall_through() {
        let err = JsonParam::new("query")
            .resolve::<UserQuery>(&ctx("/u?query=bad&query=%7B%22name%22%3A%22ok%22%7D"))
            .unwrap_err();
        assert_param_error(err);
    }

    #[test]
    fn test_declared_pattern_parses_timestamps() {
        let param = JsonParam::new("query").pattern("%d/%m/%Y").unwrap();
        let value: UserQuery = param
            .decode(Some(r#"{"name":"kim","since":"01/02/2024"}"#))
            .unwrap()
            .unwrap();
        assert_eq!(
            value.since.map(|s| s.to_string()).as_deref(),
            Some("2024-02-01 00:00:00")
        );
    }

    #[test]
    fn test_timestamp_not_matching_pattern_fails() {
        let err = JsonParam::new("query")
            .decode::<UserQuery>(Some(r#"{"name":"kim","since":"01/02/2024"}"#))
            .unwrap_err();
        assert_param_error(err);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(JsonParam::new("query").pattern("%Q").is_err());
    }
}
