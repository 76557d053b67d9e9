//! In-memory client driving an [`App`] without a socket.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use veneer_server::App;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight into [`App::handle`].
///
/// Requests pass through routing and the full pipeline exactly as they would
/// behind the HTTP server.
#[derive(Debug, Clone)]
#[must_use]
pub struct TestClient {
    app: Arc<App>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `app`.
    pub fn new(app: App) -> Self {
        Self::shared(Arc::new(app))
    }

    /// Creates a client for an already shared app.
    pub fn shared(app: Arc<App>) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the app under test.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Appends a plain query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Appends a query parameter carrying `value` as JSON.
    pub fn json_query<T: Serialize>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.builder = self.builder.json_query(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }

    /// Sends the request, reporting build and read failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?.into_http_request();
        let response = self.client.app.handle(request).await;
        TestResponse::from_http(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::{json, Value};
    use veneer_config::VeneerConfig;
    use veneer_core::{HandlerMeta, PipelineError};
    use veneer_extract::JsonParam;
    use veneer_server::Call;

    struct EchoController;

    fn client() -> TestClient {
        let mut config = VeneerConfig::default();
        config.web.result.packages = vec![module_path!().to_string()];
        let app = App::builder(config)
            .get("/echo", HandlerMeta::of::<EchoController>("echo"), |call: Call| async move {
                let condition = call.json::<Value>(&JsonParam::new("condition").required(false))?;
                let tenant = call.request().header("x-tenant").map(str::to_string);
                Ok::<_, PipelineError>(json!({ "condition": condition, "tenant": tenant }))
            })
            .post("/echo", HandlerMeta::of::<EchoController>("body"), |call: Call| async move {
                call.body::<Value>()
            })
            .build()
            .unwrap();
        TestClient::new(app)
    }

    #[tokio::test]
    async fn test_get_with_json_query() {
        let response = client()
            .get("/echo")
            .json_query("condition", &json!({"name": "kim"}))
            .send()
            .await;
        response.assert_status(StatusCode::OK).assert_envelope("0", None);
        let data: Value = response.data().unwrap();
        assert_eq!(data["condition"], json!({"name": "kim"}));
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let client = client().with_default_header("x-tenant", "acme");
        let data: Value = client.get("/echo").send().await.data().unwrap();
        assert_eq!(data["tenant"], "acme");
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let response = client().post("/echo").json(&json!([1, 2])).send().await;
        assert_eq!(response.data::<Vec<u8>>().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = client().delete("/echo").send().await;
        response
            .assert_status(StatusCode::NOT_FOUND)
            .assert_envelope(veneer_server::NOT_FOUND_CODE, None);
    }

    #[tokio::test]
    async fn test_try_send_reports_build_errors() {
        let result = client().get("/echo").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }
}
