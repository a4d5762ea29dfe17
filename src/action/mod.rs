//! Request handlers.
//!
//! # Data Flow
//! ```text
//! route registration
//!     → HandlerRef (closure, handler value, or "controller#action")
//!     → registry.rs resolves actions against the ControllerRegistry
//!     → RouteHandler stored in the dispatch table
//!
//! matched request
//!     → handler.rs RouteHandler::run(params, &mut Context)
//!     → controller actions auto-render `<action>` under `<controller>/`
//! ```
//!
//! # Design Decisions
//! - Actions resolve at registration; an unknown action never reaches a request
//! - Handlers receive the context explicitly

pub mod handler;
pub mod registry;

use thiserror::Error;

use crate::render::RenderError;

pub use handler::{ActionName, ActionResult, Handler, HandlerRef, RouteHandler};
pub use registry::{Controller, ControllerRegistry};

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("action failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
