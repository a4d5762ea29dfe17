//! Template composition subsystem.
//!
//! # Data Flow
//! ```text
//! Render request (name, layout?, sub_dir?)
//!     → resolver.rs (name + policy → file identifier)
//!     → cache.rs (identifier → shared RenderingUnit, compiled once)
//!     → compiler.rs (read + parse file into a RenderingUnit)
//!     → compose.rs (render content, render layout, splice at {{yield}})
//!     → String
//!
//! On template change:
//!     watcher.rs detects change
//!     → cache.rs drops compiled units
//!     → next render recompiles from disk
//! ```
//!
//! # Design Decisions
//! - Resolution is pure; existence is checked when a unit is loaded
//! - Units are immutable and shared read-only across requests
//! - Layout and content are both loaded before anything renders

pub mod cache;
pub mod compiler;
pub mod compose;
pub mod resolver;
pub mod watcher;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::TemplateCache;
pub use compiler::{compile, BindingContext, RenderingUnit};
pub use compose::{compose, RenderTarget, TemplateEngine, YIELD_MARKER};
pub use resolver::{TemplateId, TemplateKind, TemplatePolicy};
pub use watcher::TemplateWatcher;

/// Errors raised while loading, compiling or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The resolved file does not exist or cannot be read.
    #[error("{kind} `{name}` not found at {}", path.display())]
    NotFound {
        kind: TemplateKind,
        name: String,
        path: PathBuf,
    },

    /// The file exists but reading it failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed template tags.
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Evaluation failed while rendering.
    #[error("{}:{line}: {message}", path.display())]
    Render {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl TemplateError {
    /// True for the not-found condition surfaced to callers as terminal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound { .. })
    }
}
