//! Test response wrapper.

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use veneer_core::Envelope;

use crate::error::TestError;

/// A collected response with assertion helpers.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Collects an HTTP response.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: BodyExt,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|err| TestError::BodyRead(err.to_string()))?
            .to_bytes();
        Ok(Self::new(parts.status, parts.headers, body))
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as a string.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|value| value.to_str().ok())
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|err| TestError::BodyRead(format!("invalid UTF-8: {err}")))
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as an [`Envelope`].
    pub fn envelope(&self) -> Result<Envelope, TestError> {
        self.json()
    }

    /// Deserializes the `data` member of an enveloped body.
    ///
    /// A missing `data` member is read as `null`.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        let data = self.envelope()?.data.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the envelope code, and the message when one is given.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an envelope or does not match.
    pub fn assert_envelope(&self, code: &str, message: Option<&str>) -> &Self {
        let envelope = self
            .envelope()
            .unwrap_or_else(|err| panic!("body is not an envelope: {err}"));
        assert_eq!(envelope.code, code, "unexpected envelope code");
        if let Some(message) = message {
            assert_eq!(envelope.message.as_deref(), Some(message), "unexpected envelope message");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: StatusCode, body: &'static str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        TestResponse::new(status, headers, Bytes::from(body))
    }

    #[test]
    fn test_accessors() {
        let response = response(StatusCode::OK, r#"{"code":"0","data":{"id":1}}"#);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(response.text().unwrap().starts_with('{'));
    }

    #[test]
    fn test_envelope_data() {
        let response = response(StatusCode::OK, r#"{"code":"0","data":{"id":1}}"#);
        let data: Value = response.data().unwrap();
        assert_eq!(data, json!({"id": 1}));
        response.assert_status(StatusCode::OK).assert_envelope("0", None);
    }

    #[test]
    fn test_error_envelope() {
        let response = response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"code":"USER_ID_INVALID","message":"bad id"}"#,
        );
        response.assert_envelope("USER_ID_INVALID", Some("bad id"));
        let data: Option<u8> = response.data().unwrap();
        assert_eq!(data, None);
    }

    #[test]
    #[should_panic(expected = "expected status 200")]
    fn test_assert_status_panics() {
        response(StatusCode::NOT_FOUND, "{}").assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_from_http_collects_body() {
        let http = http::Response::builder()
            .status(StatusCode::CREATED)
            .body(http_body_util::Full::new(Bytes::from("done")))
            .unwrap();
        let response = TestResponse::from_http(http).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.text().unwrap(), "done");
    }
}
