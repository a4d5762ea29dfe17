//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an application.
//! All types derive Serde traits for deserialization from config files.
//! Unknown keys are rejected.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::render::LayoutSetting;

/// Root configuration for an application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Public site settings.
    pub site: SiteConfig,

    /// Template lookup and caching.
    pub templates: TemplateConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Routes declared in configuration, registered in order.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Public site settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Base URL used by `url()` and redirects. Falls back to the request host.
    pub base_url: Option<String>,
}

/// Template lookup, layout and caching settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Root directory all template paths are relative to.
    pub root_dir: PathBuf,

    /// Templates directory under the root.
    pub templates_dir: String,

    /// Layouts directory under the root.
    pub layouts_dir: String,

    /// Default layout: a name, or `false` for none.
    pub layout: LayoutSetting,

    /// File extension appended to template names.
    pub extension: String,

    /// Keep compiled templates in memory.
    pub cache: bool,

    /// Clear the cache when template files change.
    pub watch: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            templates_dir: "views".to_string(),
            layouts_dir: "views/layouts".to_string(),
            layout: LayoutSetting::default(),
            extension: ".html.tpl".to_string(),
            cache: true,
            watch: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A route declared in configuration.
///
/// Exactly one of `action` (`controller#action`) or `template` (a view route)
/// must be set.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Route pattern, e.g. `/artists/:name`.
    pub path: String,

    /// Controller action handling the route.
    pub action: Option<String>,

    /// Template rendered with the route params as data.
    pub template: Option<String>,

    /// Layout override for this route.
    pub layout: Option<LayoutSetting>,

    /// Sub-directory searched for bare template names.
    pub templates_sub_dir: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}
