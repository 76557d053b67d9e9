//! Records produced by instrumented calls.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use veneer_core::short_type_name;

use crate::capture::Params;
use crate::timing::Timing;

/// Static identity of an instrumented call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    class_name: &'static str,
    method_name: &'static str,
    description: String,
}

impl CallSite {
    /// Describes method `method_name` declared on `T`.
    pub fn of<T: ?Sized>(method_name: &'static str) -> Self {
        Self {
            class_name: short_type_name::<T>(),
            method_name,
            description: String::new(),
        }
    }

    /// Describes a call site by explicit names.
    pub fn named(class_name: &'static str, method_name: &'static str) -> Self {
        Self {
            class_name,
            method_name,
            description: String::new(),
        }
    }

    /// Attaches a human description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the declaring type's short name.
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Returns the method name.
    pub fn method_name(&self) -> &'static str {
        self.method_name
    }
}

/// One generic instrumented invocation.
///
/// Exactly one of `result` and `throwable` is set. Timestamps are only
/// present on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Declaring type's short name.
    pub class_name: String,
    /// Method name.
    pub method_name: String,
    /// Call site description.
    pub description: String,
    /// Captured arguments.
    pub params: Params,
    /// Return value on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throwable: Option<String>,
    /// Formatted start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Formatted end time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Elapsed milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_millis: Option<u64>,
}

impl LogRecord {
    /// Record of a call that returned.
    pub fn success(site: &CallSite, params: Params, result: Value, timing: Timing) -> Self {
        Self {
            class_name: site.class_name.to_string(),
            method_name: site.method_name.to_string(),
            description: site.description.clone(),
            params,
            result: Some(result),
            throwable: None,
            start_time: Some(timing.start_time),
            end_time: Some(timing.end_time),
            elapsed_millis: Some(timing.elapsed_millis),
        }
    }

    /// Record of a call that failed. No timing is attached.
    pub fn failure(site: &CallSite, params: Params, throwable: String) -> Self {
        Self {
            class_name: site.class_name.to_string(),
            method_name: site.method_name.to_string(),
            description: site.description.clone(),
            params,
            result: None,
            throwable: Some(throwable),
            start_time: None,
            end_time: None,
            elapsed_millis: None,
        }
    }
}

/// One handler invocation seen by the web instrumentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLogRecord {
    /// Handler type's short name.
    pub class_name: String,
    /// Handler method name.
    pub method_name: String,
    /// Request path, absent outside a request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Captured arguments.
    pub params: Params,
    /// Return value on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throwable: Option<String>,
    /// Formatted start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Formatted end time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Elapsed milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_millis: Option<u64>,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class_name, self.method_name)?;
        if !self.description.is_empty() {
            write!(f, " ({})", self.description)?;
        }
        match (&self.throwable, self.elapsed_millis) {
            (Some(err), _) => write!(f, " failed: {err}"),
            (None, Some(ms)) => write!(f, " returned in {ms}ms"),
            (None, None) => write!(f, " returned"),
        }
    }
}

impl fmt::Display for WebLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}#{}",
            self.url.as_deref().unwrap_or("-"),
            self.class_name,
            self.method_name
        )?;
        match (&self.throwable, self.elapsed_millis) {
            (Some(err), _) => write!(f, " failed: {err}"),
            (None, Some(ms)) => write!(f, " returned in {ms}ms"),
            (None, None) => write!(f, " returned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct UserService;

    fn timing() -> Timing {
        Timing {
            start_time: "2024-01-01 00:00:00:000".to_string(),
            end_time: "2024-01-01 00:00:00:004".to_string(),
            elapsed_millis: 4,
        }
    }

    #[test]
    fn test_call_site_of() {
        let site = CallSite::of::<UserService>("find").description("find user");
        assert_eq!(site.class_name(), "UserService");
        assert_eq!(site.method_name(), "find");
    }

    #[test]
    fn test_success_record_shape() {
        let site = CallSite::of::<UserService>("find");
        let record = LogRecord::success(&site, Params::new(), json!({"id": 1}), timing());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["className"], "UserService");
        assert_eq!(value["elapsedMillis"], 4);
        assert!(value.get("throwable").is_none());
        assert_eq!(record.to_string(), "UserService#find returned in 4ms");
    }

    #[test]
    fn test_failure_record_has_no_timing() {
        let site = CallSite::of::<UserService>("find");
        let record = LogRecord::failure(&site, Params::new(), "boom".to_string());
        assert!(record.result.is_none());
        assert!(record.start_time.is_none());
        assert!(record.end_time.is_none());
        assert!(record.elapsed_millis.is_none());
        assert_eq!(record.to_string(), "UserService#find failed: boom");
    }
}
