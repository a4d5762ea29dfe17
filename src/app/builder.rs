//! Route registration.
//!
//! # Responsibilities
//! - Compile route patterns into the dispatch table, in registration order
//! - Resolve `controller#action` references against the controller registry
//! - Register routes declared in configuration
//!
//! # Design Decisions
//! - Registration fails fast; a bad pattern or handler never becomes a silent no-match
//! - Controllers and helpers must be added before the routes that use them

use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;

use crate::action::{
    ActionName, ActionResult, Controller, ControllerRegistry, HandlerRef, RouteHandler,
};
use crate::app::{App, RegistrationError};
use crate::config::{AppConfig, RouteConfig};
use crate::render::{Context, HelperRegistry, Renderer};
use crate::routing::{DispatchTable, Params, RouteOptions};

/// Builder for an [`App`].
#[derive(Debug)]
pub struct AppBuilder {
    config: AppConfig,
    controllers: ControllerRegistry,
    helpers: HelperRegistry,
    table: DispatchTable<RouteHandler>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            controllers: ControllerRegistry::new(),
            helpers: HelperRegistry::new(),
            table: DispatchTable::new(),
        }
    }

    pub fn with_controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    pub fn controller(mut self, controller: Controller) -> Self {
        self.controllers.register(controller);
        self
    }

    /// Make helper `name` callable from every template.
    pub fn helper<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.helpers.register(name, helper);
        self
    }

    /// Register a route.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerRef,
        options: RouteOptions,
    ) -> Result<&mut Self, RegistrationError> {
        let handler = self.resolve(handler)?;
        self.table.register(method, pattern, handler, options)?;
        Ok(self)
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Params, &mut Context) -> ActionResult + Send + Sync + 'static,
    {
        self.route(
            Method::GET,
            pattern,
            HandlerRef::closure(handler),
            RouteOptions::default(),
        )
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Params, &mut Context) -> ActionResult + Send + Sync + 'static,
    {
        self.route(
            Method::POST,
            pattern,
            HandlerRef::closure(handler),
            RouteOptions::default(),
        )
    }

    /// Register a `controller#action` route.
    pub fn action(
        &mut self,
        method: Method,
        pattern: &str,
        action: &str,
    ) -> Result<&mut Self, RegistrationError> {
        self.route(
            method,
            pattern,
            HandlerRef::action(action),
            RouteOptions::default(),
        )
    }

    /// Register a route that renders `template` with its params as data.
    pub fn view(
        &mut self,
        method: Method,
        pattern: &str,
        template: &str,
        options: RouteOptions,
    ) -> Result<&mut Self, RegistrationError> {
        let handler = RouteHandler::View {
            template: template.to_string(),
        };
        self.table.register(method, pattern, handler, options)?;
        Ok(self)
    }

    /// Register every route from `config.routes`, in order.
    pub fn register_config_routes(&mut self) -> Result<&mut Self, RegistrationError> {
        let routes = self.config.routes.clone();
        for route in &routes {
            self.register_config_route(route)?;
        }
        Ok(self)
    }

    fn register_config_route(&mut self, route: &RouteConfig) -> Result<(), RegistrationError> {
        let method = Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| RegistrationError::InvalidMethod(route.method.clone()))?;
        let options = RouteOptions {
            layout: route.layout.clone(),
            templates_sub_dir: route.templates_sub_dir.clone(),
        };

        match (&route.action, &route.template) {
            (Some(action), None) => {
                self.route(method, &route.path, HandlerRef::action(action.as_str()), options)?;
            }
            (None, Some(template)) => {
                self.view(method, &route.path, template, options)?;
            }
            _ => return Err(RegistrationError::AmbiguousHandler(route.path.clone())),
        }
        Ok(())
    }

    fn resolve(&self, handler: HandlerRef) -> Result<RouteHandler, RegistrationError> {
        match handler {
            HandlerRef::Handler(handler) => Ok(RouteHandler::Handler(handler)),
            HandlerRef::Action(reference) => {
                let name: ActionName = reference
                    .parse()
                    .map_err(|_| RegistrationError::HandlerNotInvocable(reference.clone()))?;
                let handler = self
                    .controllers
                    .resolve(&name)
                    .ok_or_else(|| RegistrationError::HandlerNotInvocable(reference.clone()))?;
                Ok(RouteHandler::Action { name, handler })
            }
        }
    }

    /// Finish registration.
    pub fn build(self) -> App {
        let renderer = Renderer::from_config(&self.config).with_helpers(self.helpers);
        tracing::info!(routes = self.table.len(), "Application built");
        App {
            config: self.config,
            table: self.table,
            renderer: Arc::new(renderer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Render;

    fn ok(_: &Params, _: &mut Context) -> ActionResult {
        Ok(())
    }

    #[test]
    fn test_unknown_action_is_not_invocable() {
        let mut builder = AppBuilder::new(AppConfig::default());
        let err = builder
            .action(Method::GET, "/artists/:name", "artists#show")
            .unwrap_err();
        assert!(matches!(err, RegistrationError::HandlerNotInvocable(ref r) if r == "artists#show"));
        assert!(builder.table.is_empty());
    }

    #[test]
    fn test_malformed_action_reference() {
        let mut builder = AppBuilder::new(AppConfig::default());
        let err = builder.action(Method::GET, "/", "artists").unwrap_err();
        assert!(matches!(err, RegistrationError::HandlerNotInvocable(_)));
    }

    #[test]
    fn test_bad_pattern_aborts_registration() {
        let mut builder = AppBuilder::new(AppConfig::default());
        let err = builder.get("/a/:id([0-9]", ok).unwrap_err();
        assert!(matches!(err, RegistrationError::Pattern(_)));
        assert!(builder.table.is_empty());
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut builder = AppBuilder::new(AppConfig::default())
            .controller(Controller::new("artists").action("show", ok));
        builder
            .get("/a", ok)
            .unwrap()
            .action(Method::GET, "/artists/:name", "artists#show")
            .unwrap()
            .post("/a", |_: &Params, ctx: &mut Context| -> ActionResult {
                let _ = ctx.render(Render::plain("posted"))?;
                Ok(())
            })
            .unwrap();

        let app = builder.build();
        let described: Vec<_> = app
            .table()
            .entries()
            .iter()
            .map(|e| (e.method().to_string(), e.handler().describe()))
            .collect();
        assert_eq!(
            described,
            [
                ("GET".to_string(), "<closure>".to_string()),
                ("GET".to_string(), "artists#show".to_string()),
                ("POST".to_string(), "<closure>".to_string()),
            ]
        );
    }

    #[test]
    fn test_config_routes() {
        let mut config = AppConfig::default();
        config.routes = vec![
            RouteConfig {
                method: "get".to_string(),
                path: "/about".to_string(),
                action: None,
                template: Some("about".to_string()),
                layout: None,
                templates_sub_dir: None,
            },
            RouteConfig {
                method: "GET".to_string(),
                path: "/artists/:name".to_string(),
                action: Some("artists#show".to_string()),
                template: None,
                layout: Some(false.into()),
                templates_sub_dir: None,
            },
        ];

        let mut builder = AppBuilder::new(config)
            .controller(Controller::new("artists").action("show", ok));
        builder.register_config_routes().unwrap();
        let app = builder.build();

        let entries = app.table().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].handler().describe(), "view:about");
        assert_eq!(entries[1].options().layout, Some(false.into()));
    }

    #[test]
    fn test_config_route_with_bad_method() {
        let mut config = AppConfig::default();
        config.routes = vec![RouteConfig {
            method: "FE TCH".to_string(),
            path: "/".to_string(),
            action: None,
            template: Some("index".to_string()),
            layout: None,
            templates_sub_dir: None,
        }];
        let mut builder = AppBuilder::new(config);
        assert!(matches!(
            builder.register_config_routes(),
            Err(RegistrationError::InvalidMethod(_))
        ));
    }
}
