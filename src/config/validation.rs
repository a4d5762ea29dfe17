//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the template extension and timeouts
//! - Check every declared route compiles and names exactly one handler
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::Method;

use crate::action::ActionName;
use crate::config::schema::AppConfig;
use crate::routing::RoutePattern;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `routes[2].path`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate `config`, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    let extension = &config.templates.extension;
    if extension.len() < 2 || !extension.starts_with('.') {
        errors.push(ValidationError::new(
            "templates.extension",
            format!("`{}` must start with '.' and name an extension", extension),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "`{}` is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    for (i, route) in config.routes.iter().enumerate() {
        let field = |name: &str| format!("routes[{}].{}", i, name);

        if Method::from_bytes(route.method.to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::new(
                field("method"),
                format!("`{}` is not an HTTP method", route.method),
            ));
        }

        if !route.path.starts_with('/') {
            errors.push(ValidationError::new(
                field("path"),
                format!("`{}` must start with '/'", route.path),
            ));
        } else if let Err(e) = RoutePattern::compile(&route.path) {
            errors.push(ValidationError::new(field("path"), e.to_string()));
        }

        match (&route.action, &route.template) {
            (Some(action), None) => {
                if let Err(e) = action.parse::<ActionName>() {
                    errors.push(ValidationError::new(field("action"), e));
                }
            }
            (None, Some(_)) => {}
            _ => errors.push(ValidationError::new(
                field("action"),
                "exactly one of `action` or `template` must be set",
            )),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
