//! End-to-end pipeline integration tests.
//!
//! Every stage is registered and requests are driven through
//! [`Pipeline::process`] so the assertions see the serialized bytes a client
//! would receive.

use std::sync::Arc;

use bytes::Bytes;
use http::{Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use parking_lot::Mutex;
use serde_json::{json, Value};
use veneer_core::{Envelope, HandlerMeta, MessageCatalog, PipelineError, Violation};
use veneer_middleware::{
    context::MiddlewareContext,
    pipeline::{Pipeline, Stage},
    stages::{
        ErrorNormalizationMiddleware, ResponseEnvelopeMiddleware, RequestIdMiddleware,
        WebLogMiddleware,
    },
    types::{Outcome, Reply, Request, Response},
    FnMiddleware,
};
use veneer_telemetry::{LogSink, TimePattern, WebLogRecord};

mod controller {
    pub struct UserController;
}

struct HealthCheck;

#[derive(Default)]
struct Collect(Mutex<Vec<WebLogRecord>>);

impl LogSink<WebLogRecord> for Collect {
    fn handle(&self, record: &WebLogRecord) -> anyhow::Result<()> {
        self.0.lock().push(record.clone());
        Ok(())
    }
}

fn pipeline(sink: Arc<dyn LogSink<WebLogRecord>>) -> Pipeline {
    let catalog = Arc::new(MessageCatalog::from_entries([(
        "USER_1001",
        "user already exists",
    )]));
    Pipeline::builder()
        .stage(Stage::WebLog, WebLogMiddleware::new(sink, TimePattern::default()))
        .stage(Stage::RequestId, RequestIdMiddleware::new())
        .stage(
            Stage::ResponseEnvelope,
            ResponseEnvelopeMiddleware::new(["pipeline_e2e::controller"]).unwrap(),
        )
        .stage(
            Stage::ErrorNormalization,
            ErrorNormalizationMiddleware::new(catalog),
        )
        .build()
}

fn user_ctx() -> MiddlewareContext {
    MiddlewareContext::new().with_handler(HandlerMeta::of::<controller::UserController>("find"))
}

fn make_request(path: &str) -> Request {
    HttpRequest::builder()
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_stage_order() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    assert_eq!(
        pipeline.stage_names(),
        vec!["request_id", "response_envelope", "error_normalization", "web_log"]
    );
}

#[tokio::test]
async fn test_success_is_enveloped() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    let response = pipeline
        .process(user_ctx(), make_request("/user/1"), |_ctx, _req| {
            Box::pin(async { Outcome::Ok(Reply::ok(json!({"id": 1, "name": "ada"}))) })
        })
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        json_body(response).await,
        json!({"code": "0", "data": {"id": 1, "name": "ada"}})
    );
}

#[tokio::test]
async fn test_bare_string_is_enveloped_before_serialization() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    let response = pipeline
        .process(user_ctx(), make_request("/ping"), |_ctx, _req| {
            Box::pin(async { Reply::from_value("pong") })
        })
        .await;
    assert_eq!(json_body(response).await, json!({"code": "0", "data": "pong"}));
}

#[tokio::test]
async fn test_business_error_message_from_catalog() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    let response = pipeline
        .process(user_ctx(), make_request("/user"), |_ctx, _req| {
            Box::pin(async { Outcome::Err(PipelineError::business_code("USER_1001")) })
        })
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"code": "USER_1001", "message": "user already exists"})
    );
}

#[tokio::test]
async fn test_first_violation_is_reported() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    let response = pipeline
        .process(user_ctx(), make_request("/user"), |_ctx, _req| {
            Box::pin(async {
                Outcome::Err(PipelineError::violations(vec![
                    Violation::new("name", "must not be null"),
                    Violation::new("age", "must be positive"),
                ]))
            })
        })
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"code": "VALIDATION", "message": "must not be null"})
    );
}

#[tokio::test]
async fn test_handler_envelope_is_not_wrapped_twice() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    let response = pipeline
        .process(user_ctx(), make_request("/user"), |_ctx, _req| {
            Box::pin(async { Reply::from_value(Envelope::error("CUSTOM", "handled")) })
        })
        .await;
    assert_eq!(
        json_body(response).await,
        json!({"code": "CUSTOM", "message": "handled"})
    );
}

#[tokio::test]
async fn test_handlers_outside_packages_are_not_enveloped() {
    let pipeline = pipeline(Arc::new(Collect::default()));
    let ctx = MiddlewareContext::new().with_handler(HandlerMeta::of::<HealthCheck>("check"));
    let response = pipeline
        .process(ctx, make_request("/health"), |_ctx, _req| {
            Box::pin(async { Outcome::Ok(Reply::ok(json!("up"))) })
        })
        .await;
    assert_eq!(json_body(response).await, json!("up"));
}

#[tokio::test]
async fn test_web_log_sees_captured_args_and_failures() {
    let sink = Arc::new(Collect::default());
    let pipeline = pipeline(sink.clone());
    let _ = pipeline
        .process(user_ctx(), make_request("/user/-1"), |ctx, _req| {
            ctx.captured_args().record_value(&-1_i64);
            Box::pin(async { Outcome::Err(PipelineError::business("USER_ID_INVALID", "bad id")) })
        })
        .await;

    let records = sink.0.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url.as_deref(), Some("/user/-1"));
    assert_eq!(records[0].params.get("i64"), Some(&json!(-1)));
    assert!(records[0].throwable.is_some());
    assert!(records[0].elapsed_millis.is_none());
}

#[tokio::test]
async fn test_failing_sink_keeps_response() {
    let sink: Arc<dyn LogSink<WebLogRecord>> =
        Arc::new(|_: &WebLogRecord| -> anyhow::Result<()> { anyhow::bail!("unreachable collector") });
    let response = pipeline(sink)
        .process(user_ctx(), make_request("/user/1"), |_ctx, _req| {
            Box::pin(async { Outcome::Ok(Reply::ok(json!(1))) })
        })
        .await;
    assert_eq!(json_body(response).await, json!({"code": "0", "data": 1}));
}

#[tokio::test]
async fn test_broken_sink_keeps_error_envelope() {
    async fn duplicate_user(sink: Arc<dyn LogSink<WebLogRecord>>) -> (StatusCode, Value) {
        let response = pipeline(sink)
            .process(user_ctx(), make_request("/user"), |_ctx, _req| {
                Box::pin(async { Outcome::Err(PipelineError::business_code("USER_1001")) })
            })
            .await;
        (response.status(), json_body(response).await)
    }

    let healthy = duplicate_user(Arc::new(Collect::default())).await;
    assert_eq!(healthy.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        healthy.1,
        json!({"code": "USER_1001", "message": "user already exists"})
    );

    let failing: Arc<dyn LogSink<WebLogRecord>> =
        Arc::new(|_: &WebLogRecord| -> anyhow::Result<()> { anyhow::bail!("unreachable collector") });
    let panicking: Arc<dyn LogSink<WebLogRecord>> =
        Arc::new(|_: &WebLogRecord| -> anyhow::Result<()> { panic!("collector crashed") });
    assert_eq!(duplicate_user(failing).await, healthy);
    assert_eq!(duplicate_user(panicking).await, healthy);
}

#[tokio::test]
async fn test_extension_stage_runs_between_core_stages() {
    let pipeline = Pipeline::builder()
        .stage(
            Stage::Extension,
            FnMiddleware::new("deny_all", |_ctx, _req, _next| {
                Box::pin(async { Outcome::Err(PipelineError::business("DENIED", "closed")) })
            }),
        )
        .stage(
            Stage::ErrorNormalization,
            ErrorNormalizationMiddleware::new(Arc::new(MessageCatalog::new())),
        )
        .build();

    let response = pipeline
        .process(user_ctx(), make_request("/user"), |_ctx, _req| {
            Box::pin(async { Outcome::Ok(Reply::ok(json!("unreachable"))) })
        })
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"code": "DENIED", "message": "closed"})
    );
}
