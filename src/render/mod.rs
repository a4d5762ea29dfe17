//! Render call surface exposed to handlers.
//!
//! # Data Flow
//! ```text
//! handler(params, &mut Context)
//!     → context.rs render(Render)
//!     → options.rs (validate, pick body kind)
//!     → json / js / plain / html: written as-is
//!     → template / partial: TemplateEngine::find_and_render with Context as receiver
//!     → response.rs (buffered status, content type, headers, body)
//! ```
//!
//! # Design Decisions
//! - Every render is fully produced before it touches the response
//! - A halted request ignores later renders
//! - A template name renders at most once per request

pub mod context;
pub mod helpers;
pub mod options;
pub mod response;

use thiserror::Error;

use crate::template::TemplateError;

pub use context::{Context, Flow, Renderer};
pub use helpers::HelperRegistry;
pub use options::{Body, LayoutSetting, Render, DEFAULT_LAYOUT};
pub use response::{ContentType, Response};

/// Errors raised by a render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Options that are not a template name or options object, carry unknown
    /// keys, or ask for more than one kind of body.
    #[error("invalid render argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub fn is_template_not_found(&self) -> bool {
        matches!(self, RenderError::Template(e) if e.is_not_found())
    }
}
