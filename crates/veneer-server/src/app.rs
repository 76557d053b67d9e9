//! Application assembly: routes, pipeline and catalog built from config.
//!
//! ```rust
//! use http::Method;
//! use veneer_config::VeneerConfig;
//! use veneer_core::{HandlerMeta, PipelineError};
//! use veneer_server::{App, Call};
//!
//! struct PingController;
//!
//! let mut config = VeneerConfig::default();
//! config.web.result.packages = vec!["ping_service".into()];
//!
//! let app = App::builder(config)
//!     .route(Method::GET, "/ping", HandlerMeta::of::<PingController>("ping"), |_call: Call| async {
//!         Ok::<_, PipelineError>("pong")
//!     })
//!     .build()
//!     .unwrap();
//! assert_eq!(app.route_count(), 1);
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use veneer_config::VeneerConfig;
use veneer_core::{HandlerMeta, MessageSource, PipelineError};
use veneer_extract::{ExtractionContext, PathParams};
use veneer_middleware::stages::{
    ErrorNormalizationMiddleware, FlowLimitMiddleware, RequestIdMiddleware,
    ResponseEnvelopeMiddleware, WebLogMiddleware,
};
use veneer_middleware::{
    BoxFuture, BoxedMiddleware, Instrumentation, Middleware, MiddlewareContext, Outcome, Pipeline,
    Request, Response, ResponseExt, Stage,
};
use veneer_telemetry::{LogRecord, LogSink, TracingSink, WebLogRecord};

use crate::error::{ServerError, ServerResult};
use crate::handler::{BoxedHandler, Call, Handler};
use crate::info::{info_handler, info_meta};
use crate::router::Router;

/// Error code of the 404 reply for unmatched routes.
pub const NOT_FOUND_CODE: &str = "NOT_FOUND";

#[derive(Clone)]
struct Endpoint {
    meta: HandlerMeta,
    handler: BoxedHandler,
}

/// A routable, pipeline-wrapped application.
pub struct App {
    router: Router<Endpoint>,
    pipeline: Pipeline,
    resolver_enabled: bool,
    instrumentation: Instrumentation,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.route_count())
            .field("pipeline", &self.pipeline)
            .field("resolver_enabled", &self.resolver_enabled)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Starts building an app from `config`.
    #[must_use]
    pub fn builder(config: VeneerConfig) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Routes one request and runs it through the pipeline.
    ///
    /// Unmatched requests get a 404 envelope without entering the pipeline.
    pub async fn handle(&self, request: Request) -> Response {
        let Some(matched) = self.router.match_route(request.method(), request.uri().path()) else {
            tracing::debug!(
                method = %request.method(),
                path = request.uri().path(),
                "no route matched"
            );
            let message = format!("no route for {} {}", request.method(), request.uri().path());
            return Response::json_error(StatusCode::NOT_FOUND, NOT_FOUND_CODE, &message);
        };

        let Endpoint { meta, handler } = matched.value().clone();
        let params = matched.into_params();
        let ctx = MiddlewareContext::new().with_handler(meta);
        let terminal = terminal(
            handler,
            meta,
            params,
            self.resolver_enabled,
            self.instrumentation.clone(),
        );

        self.pipeline.process(ctx, request, terminal).await
    }

    /// Returns the assembled pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the generic instrumentation configured from `aspect`.
    ///
    /// Handlers see the same instance through [`Call::instrumentation`].
    #[must_use]
    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    /// Returns the number of registered routes, the info route included.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.route_count()
    }

    /// Returns `(method, template)` of every route.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.router.routes()
    }
}

fn terminal(
    handler: BoxedHandler,
    meta: HandlerMeta,
    params: PathParams,
    resolver_enabled: bool,
    instrumentation: Instrumentation,
) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Outcome> + Send + 'static {
    move |ctx: &mut MiddlewareContext, request: Request| -> BoxFuture<'static, Outcome> {
        let captured = ctx.captured_args().clone();
        let request_id = ctx.request_id();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };
            let request = ExtractionContext::new(parts.method, parts.uri, parts.headers, body, params);
            let call = Call::new(request, captured, resolver_enabled, request_id, meta)
                .with_instrumentation(instrumentation);
            let invocation = AssertUnwindSafe(async move { handler.call(call).await });
            match invocation.catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let err = PipelineError::panic(payload.as_ref());
                    tracing::error!(
                        class = meta.class_name(),
                        method = meta.method(),
                        error = %err,
                        "handler panicked"
                    );
                    Err(err)
                }
            }
        })
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    config: VeneerConfig,
    routes: Vec<(Method, String, Endpoint)>,
    extensions: Vec<BoxedMiddleware>,
    catalog: Option<Arc<dyn MessageSource>>,
    web_log_sink: Option<Arc<dyn LogSink<WebLogRecord>>>,
    aspect_sink: Option<Arc<dyn LogSink<LogRecord>>>,
}

impl AppBuilder {
    /// Creates a builder over `config`.
    #[must_use]
    pub fn new(config: VeneerConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
            extensions: Vec::new(),
            catalog: None,
            web_log_sink: None,
            aspect_sink: None,
        }
    }

    /// Registers a handler.
    #[must_use]
    pub fn route<H: Handler>(
        mut self,
        method: Method,
        path: impl Into<String>,
        meta: HandlerMeta,
        handler: H,
    ) -> Self {
        let endpoint = Endpoint {
            meta,
            handler: Arc::new(handler),
        };
        self.routes.push((method, path.into(), endpoint));
        self
    }

    /// Registers a `GET` handler.
    #[must_use]
    pub fn get<H: Handler>(self, path: impl Into<String>, meta: HandlerMeta, handler: H) -> Self {
        self.route(Method::GET, path, meta, handler)
    }

    /// Registers a `POST` handler.
    #[must_use]
    pub fn post<H: Handler>(self, path: impl Into<String>, meta: HandlerMeta, handler: H) -> Self {
        self.route(Method::POST, path, meta, handler)
    }

    /// Registers a `PUT` handler.
    #[must_use]
    pub fn put<H: Handler>(self, path: impl Into<String>, meta: HandlerMeta, handler: H) -> Self {
        self.route(Method::PUT, path, meta, handler)
    }

    /// Registers a `DELETE` handler.
    #[must_use]
    pub fn delete<H: Handler>(self, path: impl Into<String>, meta: HandlerMeta, handler: H) -> Self {
        self.route(Method::DELETE, path, meta, handler)
    }

    /// Adds an application stage in the extension slot.
    #[must_use]
    pub fn extension<M: Middleware>(mut self, middleware: M) -> Self {
        self.extensions.push(Arc::new(middleware));
        self
    }

    /// Replaces the catalog built from the `messages` section.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<dyn MessageSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sends web log records to `sink` instead of `tracing`.
    #[must_use]
    pub fn web_log_sink(mut self, sink: Arc<dyn LogSink<WebLogRecord>>) -> Self {
        self.web_log_sink = Some(sink);
        self
    }

    /// Sends generic instrumentation records to `sink` instead of `tracing`.
    #[must_use]
    pub fn aspect_sink(mut self, sink: Arc<dyn LogSink<LogRecord>>) -> Self {
        self.aspect_sink = Some(sink);
        self
    }

    /// Returns the instrumentation the built app installs.
    ///
    /// Services constructed before their routes are registered take it from
    /// here. Set [`aspect_sink`](Self::aspect_sink) first; the returned value
    /// shares the sink registered at the time of the call.
    pub fn instrumentation(&self) -> ServerResult<Instrumentation> {
        let sink = self
            .aspect_sink
            .clone()
            .unwrap_or_else(|| Arc::new(TracingSink));
        let pattern = self.config.time_pattern()?;
        Ok(Instrumentation::new(sink, pattern).enabled(self.config.aspect.enabled))
    }

    /// Validates the configuration and assembles the app.
    pub fn build(self) -> ServerResult<App> {
        self.config.validate()?;
        let instrumentation = self.instrumentation()?;
        let Self {
            config,
            routes,
            extensions,
            catalog,
            web_log_sink,
            ..
        } = self;

        let pattern = config.time_pattern()?;
        let catalog: Arc<dyn MessageSource> = catalog.unwrap_or_else(|| Arc::new(config.catalog()));
        let web = &config.web;

        let mut builder = Pipeline::builder()
            .catalog(Arc::clone(&catalog))
            .stage(Stage::RequestId, RequestIdMiddleware::new())
            .stage_if(
                web.advice.enabled,
                Stage::ErrorNormalization,
                ErrorNormalizationMiddleware::new(Arc::clone(&catalog)),
            )
            .stage_if(
                web.log.enabled,
                Stage::WebLog,
                WebLogMiddleware::new(
                    web_log_sink.unwrap_or_else(|| Arc::new(TracingSink)),
                    pattern.clone(),
                ),
            );
        if web.result.enabled {
            builder = builder.stage(
                Stage::ResponseEnvelope,
                ResponseEnvelopeMiddleware::new(web.result.packages.iter().cloned())?,
            );
        }
        if web.flow_limit.enabled {
            builder = builder.stage(
                Stage::FlowLimit,
                FlowLimitMiddleware::new(
                    web.flow_limit.max_concurrent,
                    web.flow_limit.code.as_str(),
                    web.flow_limit.message.as_str(),
                ),
            );
        }
        for extension in extensions {
            builder = builder.stage_boxed(Stage::Extension, extension);
        }
        let pipeline = builder.build();

        let mut router = Router::new();
        if web.info.enabled {
            let endpoint = Endpoint {
                meta: info_meta(),
                handler: info_handler(web.info.params.clone()),
            };
            router.add_route(Method::GET, web.info.path.as_str(), endpoint);
        }
        for (method, path, endpoint) in routes {
            if router.routes().any(|(m, p)| *m == method && p == path) {
                return Err(ServerError::DuplicateRoute {
                    method: method.to_string(),
                    path,
                });
            }
            router.add_route(method, path, endpoint);
        }

        tracing::info!(
            routes = router.route_count(),
            stages = ?pipeline.stage_names(),
            "application assembled"
        );

        Ok(App {
            router,
            pipeline,
            resolver_enabled: web.resolver.json.enabled,
            instrumentation,
        })
    }
}
