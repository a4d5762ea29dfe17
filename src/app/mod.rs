//! Application assembly and request handling.
//!
//! # Data Flow
//! ```text
//! AppConfig + controllers + helpers
//!     → builder.rs (compile routes, resolve actions) → App
//!
//! RequestInfo
//!     → App::handle
//!     → DispatchTable::dispatch (first match wins)
//!     → RouteHandler::run(params, &mut Context)
//!     → Outcome::Handled(Response) | Outcome::NotFound
//! ```
//!
//! # Design Decisions
//! - The table is immutable after build; `App` is shared behind `Arc`
//! - No match is an outcome, not an error

pub mod builder;
pub mod request;

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::action::{ActionError, RouteHandler};
use crate::config::AppConfig;
use crate::observability::metrics;
use crate::render::{Context, Renderer, Response};
use crate::routing::{Dispatch, DispatchTable, PatternError};

pub use builder::AppBuilder;
pub use request::RequestInfo;

/// Errors raised while registering routes.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("handler `{0}` cannot be invoked")]
    HandlerNotInvocable(String),

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("route `{0}` must set exactly one of `action` or `template`")]
    AmbiguousHandler(String),
}

/// Errors raised while handling a matched request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("handler for {method} {path} failed: {source}")]
    Handler {
        method: String,
        path: String,
        #[source]
        source: ActionError,
    },
}

/// Result of handling one request.
#[derive(Debug)]
pub enum Outcome {
    Handled(Response),
    NotFound,
}

/// A built application: routes plus render settings.
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    table: DispatchTable<RouteHandler>,
    renderer: Arc<Renderer>,
}

impl App {
    pub fn builder(config: AppConfig) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn table(&self) -> &DispatchTable<RouteHandler> {
        &self.table
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// Dispatch `request` to the first matching route and run its handler.
    pub fn handle(&self, request: RequestInfo) -> Result<Outcome, RequestError> {
        let start = Instant::now();
        let method = request.method.to_string();
        let method_label = metrics::method_label(&request.method);

        let (entry, params) = match self.table.dispatch(&request.method, &request.path) {
            Dispatch::Matched { entry, params } => (entry, params),
            Dispatch::NotFound => {
                tracing::debug!(method = %method, path = %request.path, "No route matched");
                metrics::record_dispatch(method_label, "not_found", start.elapsed());
                return Ok(Outcome::NotFound);
            }
        };

        tracing::debug!(
            method = %method,
            path = %request.path,
            route = %entry.pattern(),
            handler = %entry.handler().describe(),
            "Route matched"
        );

        let path = request.path.clone();
        let mut ctx = Context::new(
            Arc::clone(&self.renderer),
            request,
            params.clone(),
            entry.options(),
        );

        if let Err(source) = entry.handler().run(&params, &mut ctx) {
            tracing::error!(method = %method, path = %path, error = %source, "Handler failed");
            metrics::record_dispatch(method_label, "error", start.elapsed());
            return Err(RequestError::Handler {
                method,
                path,
                source,
            });
        }

        let response = ctx.into_response();
        metrics::record_dispatch(method_label, "handled", start.elapsed());
        Ok(Outcome::Handled(response))
    }
}
