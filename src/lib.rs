//! Trellis: a small web router with layout-composed templates.

pub mod action;
pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod routing;
pub mod template;

pub use app::{App, AppBuilder, Outcome, RequestInfo};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use render::{Context, Flow, Render};
