//! The uniform response body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorRecord;

/// Code carried by every successful envelope.
pub const SUCCESS_CODE: &str = "0";

/// Code used when a non-200 body is not an [`ErrorRecord`].
pub const UNCAUGHT_ERROR_CODE: &str = "UNCAUGHT_ERROR_CODE";

/// Wire shape of every enveloped response: `{code, message?, data?}`.
///
/// # Example
///
/// ```
/// use veneer_core::Envelope;
/// use serde_json::json;
///
/// let envelope = Envelope::success(json!({"id": 1}));
/// assert_eq!(
///     serde_json::to_string(&envelope).unwrap(),
///     r#"{"code":"0","data":{"id":1}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// `"0"` on success, an error code otherwise.
    pub code: String,
    /// Human message, errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload, success only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Wraps a successful payload. `null` payloads are omitted.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            message: None,
            data: (!data.is_null()).then_some(data),
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            data: None,
        }
    }

    /// Builds the envelope for a classified error. The trace is not exposed.
    #[must_use]
    pub fn from_record(record: &ErrorRecord) -> Self {
        Self::error(record.code.clone(), record.message.clone())
    }

    /// Returns `true` for the success code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_shape() {
        let envelope = Envelope::error("USER_1001", "用户信息已存在");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"code": "USER_1001", "message": "用户信息已存在"})
        );
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_null_payload_omitted() {
        let envelope = Envelope::success(Value::Null);
        assert_eq!(serde_json::to_string(&envelope).unwrap(), r#"{"code":"0"}"#);
    }

    #[test]
    fn test_string_payload() {
        let envelope = Envelope::success(json!("pong"));
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"code":"0","data":"pong"}"#
        );
    }

    #[test]
    fn test_from_record_hides_trace() {
        let mut record = ErrorRecord::new("X", "y");
        record.record_hop(crate::ServiceCallInfo::new("h:1", "a", "Api", "m"));
        let value = serde_json::to_value(Envelope::from_record(&record)).unwrap();
        assert_eq!(value, json!({"code": "X", "message": "y"}));
    }
}
