//! Request, reply and response types used throughout the pipeline.
//!
//! Stages exchange a typed [`Reply`] (or a [`PipelineError`]) rather than raw
//! bytes. The reply is turned into a [`Response`] only after every stage has
//! run, so the response enveloper always sees the handler's value before JSON
//! conversion.

use std::any::Any;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::Value;
use veneer_core::{Envelope, ErrorRecord, PipelineError, SYSTEM};

/// HTTP request type used by the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// HTTP response type produced by the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// What every stage and handler returns.
pub type Outcome = Result<Reply, PipelineError>;

/// Body of a [`Reply`] before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// A plain handler value.
    Value(Value),
    /// A classified error.
    Error(ErrorRecord),
    /// An already enveloped body.
    Envelope(Envelope),
}

impl ReplyBody {
    /// Returns the body as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Error(record) => serde_json::to_value(record).unwrap_or(Value::Null),
            Self::Envelope(envelope) => serde_json::to_value(envelope).unwrap_or(Value::Null),
        }
    }

    fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        let bytes = match self {
            Self::Value(value) => serde_json::to_vec(value)?,
            Self::Error(record) => serde_json::to_vec(record)?,
            Self::Envelope(envelope) => serde_json::to_vec(envelope)?,
        };
        Ok(Bytes::from(bytes))
    }
}

/// A typed response travelling back through the pipeline.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: ReplyBody,
    headers: HeaderMap,
}

impl Reply {
    /// Creates a reply.
    pub fn new(status: StatusCode, body: ReplyBody) -> Self {
        Self {
            status,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// A 200 reply carrying `value`.
    pub fn ok(value: Value) -> Self {
        Self::new(StatusCode::OK, ReplyBody::Value(value))
    }

    /// A reply carrying a classified error.
    pub fn error(status: StatusCode, record: ErrorRecord) -> Self {
        Self::new(status, ReplyBody::Error(record))
    }

    /// A 200 reply for a handler's return value.
    ///
    /// An [`Envelope`] returned by the handler is kept as an envelope so it
    /// is not wrapped a second time.
    pub fn from_value<R: Serialize + Any>(value: R) -> Result<Self, PipelineError> {
        if let Some(envelope) = (&value as &dyn Any).downcast_ref::<Envelope>() {
            return Ok(Self::new(StatusCode::OK, ReplyBody::Envelope(envelope.clone())));
        }
        Ok(Self::ok(serde_json::to_value(value)?))
    }

    /// Returns the status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the body.
    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    /// Replaces the body, keeping status and headers.
    pub fn with_body(mut self, body: ReplyBody) -> Self {
        self.body = body;
        self
    }

    /// Replaces the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns mutable headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Serializes the reply to JSON. Runs last in the pipeline.
    pub fn into_response(self) -> Response {
        match self.body.to_bytes() {
            Ok(bytes) => build_response(self.status, self.headers, bytes),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize reply body");
                let fallback = ReplyBody::Envelope(Envelope::error(SYSTEM, err.to_string()));
                let bytes = fallback.to_bytes().unwrap_or_default();
                build_response(StatusCode::INTERNAL_SERVER_ERROR, self.headers, bytes)
            }
        }
    }
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Extension trait for building error responses outside the pipeline.
pub trait ResponseExt {
    /// Creates an enveloped JSON error response.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        Reply::new(status, ReplyBody::Envelope(Envelope::error(code, message))).into_response()
    }
}
