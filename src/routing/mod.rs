//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     "/artist/:name/:track_id([0-9]+)"
//!     → pattern.rs (scan :params, splice sub-patterns, anchor)
//!     → RoutePattern { regex, param names }
//!     → router.rs (append to DispatchTable in registration order)
//!
//! Incoming Request (method, path)
//!     → router.rs (scan entries in order)
//!     → matcher.rs (apply anchored regex, bind params)
//!     → Return: Matched { entry, params } or NotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - A spec that fails to compile never reaches the table
//! - Deterministic: same input always matches same route
//! - First match wins (registration order, no specificity ranking)

pub mod matcher;
pub mod pattern;
pub mod router;

pub use matcher::Params;
pub use pattern::{PatternError, RoutePattern, DEFAULT_PARAM_PATTERN};
pub use router::{Dispatch, DispatchEntry, DispatchTable, RouteOptions};
