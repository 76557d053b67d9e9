//! HTTP/1.1 server over an [`App`].
//!
//! Each accepted connection is served by hyper on its own task. Request
//! bodies are collected in full before the request enters the pipeline.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use veneer_config::VeneerConfig;
//! use veneer_server::{App, Server};
//!
//! # async fn run(config: VeneerConfig) -> Result<(), veneer_server::ServerError> {
//! let app = App::builder(config.clone()).build()?;
//! Server::new(Arc::new(app), &config.server).run().await
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use veneer_config::ServerConfig;
use veneer_middleware::{Response, ResponseExt};

use crate::app::App;
use crate::error::{ServerError, ServerResult};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Error code returned when a request body cannot be read.
pub const BODY_READ_ERROR: &str = "BODY_READ_ERROR";

/// Serves an [`App`] until shut down.
#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    http_addr: String,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server for `app` using the `server` config section.
    #[must_use]
    pub fn new(app: Arc<App>, config: &ServerConfig) -> Self {
        Self {
            app,
            http_addr: config.http_addr.clone(),
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        }
    }

    /// Returns the configured listen address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let listener = TcpListener::bind(self.http_addr.as_str())
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.http_addr.clone(),
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Accepts connections on `listener` until `shutdown` fires, then waits
    /// for open connections up to the shutdown timeout.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let app = Arc::clone(&self.app);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(app, stream, shutdown).await {
                                tracing::warn!(remote = %remote, error = %err, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        tracing::info!(
            active = tracker.active_connections(),
            timeout = ?self.shutdown_timeout,
            "draining connections"
        );
        if tokio::time::timeout(self.shutdown_timeout, tracker.drained())
            .await
            .is_err()
        {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with open connections"
            );
        }
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    app: Arc<App>,
    stream: TcpStream,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: http::Request<Incoming>| {
        let app = Arc::clone(&app);
        async move { Ok::<_, Infallible>(handle(&app, request).await) }
    });
    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

async fn handle(app: &App, request: http::Request<Incoming>) -> Response {
    let (parts, body) = request.into_parts();
    let body: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read request body");
            return Response::json_error(
                StatusCode::BAD_REQUEST,
                BODY_READ_ERROR,
                &format!("failed to read request body: {err}"),
            );
        }
    };
    app.handle(http::Request::from_parts(parts, Full::new(body)))
        .await
}

/// Binds `addr`, for callers that need the bound port before serving.
pub async fn bind(addr: SocketAddr) -> ServerResult<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use veneer_config::VeneerConfig;
    use veneer_core::{HandlerMeta, PipelineError};

    use crate::handler::Call;

    struct PingController;

    fn app() -> Arc<App> {
        let mut config = VeneerConfig::default();
        config.web.result.packages = vec![module_path!().to_string()];
        let app = App::builder(config)
            .get("/ping", HandlerMeta::of::<PingController>("ping"), |_call: Call| async {
                Ok::<_, PipelineError>("pong")
            })
            .build()
            .unwrap();
        Arc::new(app)
    }

    fn server_config(addr: &str) -> ServerConfig {
        ServerConfig {
            http_addr: addr.to_string(),
            shutdown_timeout_secs: 1,
        }
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_enveloped_response() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let server = Server::new(app(), &server_config("127.0.0.1:0"));
        let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

        let response = raw_get(addr, "/ping").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("x-request-id"));
        assert!(response.ends_with(r#"{"code":"0","data":"pong"}"#));

        let missing = raw_get(addr, "/nope").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let server = Server::new(app(), &server_config("not-an-address"));
        let err = server
            .run_with_shutdown(ShutdownSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_stops_when_already_triggered() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let server = Server::new(app(), &server_config("127.0.0.1:0"));
        let result = tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(shutdown)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }
}
