//! Explicit controller registry.
//!
//! # Responsibilities
//! - Hold controllers and their named actions
//! - Resolve `controller#action` references at route registration
//!
//! # Design Decisions
//! - Lookups try the exact name, then dashes as underscores, then a leading
//!   underscore (for action names that clash with keywords, e.g. `_new`)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::handler::{ActionName, ActionResult, Handler};
use crate::render::Context;
use crate::routing::Params;

/// A named group of actions.
#[derive(Clone)]
pub struct Controller {
    name: String,
    actions: HashMap<String, Arc<dyn Handler>>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an action.
    pub fn action<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Params, &mut Context) -> ActionResult + Send + Sync + 'static,
    {
        self.handler(name, f)
    }

    /// Add an action implemented by a handler value.
    pub fn handler<H: Handler + 'static>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.actions.insert(name.into(), Arc::new(handler));
        self
    }

    /// Find the handler for `action`.
    pub fn find(&self, action: &str) -> Option<Arc<dyn Handler>> {
        let underscored = action.replace('-', "_");
        [action.to_string(), underscored.clone(), format!("_{}", underscored)]
            .iter()
            .find_map(|name| self.actions.get(name))
            .cloned()
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.action_names().collect();
        actions.sort_unstable();
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("actions", &actions)
            .finish()
    }
}

/// Controllers available to `controller#action` routes.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller, replacing one with the same name.
    pub fn register(&mut self, controller: Controller) -> &mut Self {
        self.controllers
            .insert(controller.name().to_string(), controller);
        self
    }

    pub fn with(mut self, controller: Controller) -> Self {
        self.register(controller);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Controller> {
        self.controllers.get(name)
    }

    /// Handler for `name`, or `None` if the controller or action is unknown.
    pub fn resolve(&self, name: &ActionName) -> Option<Arc<dyn Handler>> {
        self.get(name.controller())?.find(name.action())
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Params, _: &mut Context) -> ActionResult {
        Ok(())
    }

    fn registry() -> ControllerRegistry {
        ControllerRegistry::new().with(
            Controller::new("artists")
                .action("show", noop)
                .action("top_rated", noop)
                .action("_new", noop),
        )
    }

    #[test]
    fn test_resolve_exact() {
        let name: ActionName = "artists#show".parse().unwrap();
        assert!(registry().resolve(&name).is_some());
    }

    #[test]
    fn test_resolve_dashes_as_underscores() {
        let name: ActionName = "artists#top-rated".parse().unwrap();
        assert!(registry().resolve(&name).is_some());
    }

    #[test]
    fn test_resolve_underscore_prefixed() {
        let name: ActionName = "artists#new".parse().unwrap();
        assert!(registry().resolve(&name).is_some());
    }

    #[test]
    fn test_unknown_controller_or_action() {
        let registry = registry();
        assert!(registry.resolve(&"albums#show".parse().unwrap()).is_none());
        assert!(registry.resolve(&"artists#delete".parse().unwrap()).is_none());
    }
}
