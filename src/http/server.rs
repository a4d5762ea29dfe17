//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single fallback handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Convert each request into `RequestInfo` and run it through the app
//! - Map outcomes to HTTP responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::{App, Outcome, RequestInfo};
use crate::http::request::{request_id, MakeRequestUuidV4};

/// HTTP server for an application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `app`.
    pub fn new(app: Arc<App>) -> Self {
        let router = Self::build_router(app);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(app: Arc<App>) -> Router {
        let timeout = Duration::from_secs(app.config().timeouts.request_secs);
        Router::new()
            .fallback(dispatch_handler)
            .with_state(app)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Fallback handler: every request goes through the app's dispatch table.
async fn dispatch_handler(State(app): State<Arc<App>>, request: Request<Body>) -> Response {
    let request_id = request_id(&request).unwrap_or("unknown").to_string();

    let mut info = RequestInfo::from_uri(request.method().clone(), request.uri());
    if let Some(host) = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
    {
        info = info.with_host(host);
    }

    tracing::debug!(
        request_id = %request_id,
        method = %info.method,
        path = %info.path,
        "Dispatching request"
    );

    // Template loads read from disk.
    let outcome = tokio::task::spawn_blocking(move || app.handle(info)).await;

    match outcome {
        Ok(Ok(Outcome::Handled(response))) => response.into_response(),
        Ok(Ok(Outcome::NotFound)) => {
            (StatusCode::NOT_FOUND, "No matching route found").into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %request_id, error = %e, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
