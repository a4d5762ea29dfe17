//! Handler trait and route handler variants.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::action::ActionError;
use crate::render::{Context, Render};
use crate::routing::Params;

pub type ActionResult = Result<(), ActionError>;

/// A request handler: matched params in, response written through the context.
pub trait Handler: Send + Sync {
    fn call(&self, params: &Params, ctx: &mut Context) -> ActionResult;
}

impl<F> Handler for F
where
    F: Fn(&Params, &mut Context) -> ActionResult + Send + Sync,
{
    fn call(&self, params: &Params, ctx: &mut Context) -> ActionResult {
        self(params, ctx)
    }
}

/// A `controller#action` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionName {
    controller: String,
    action: String,
}

impl ActionName {
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The action as written, also the name of its auto-rendered template.
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl FromStr for ActionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            Some((controller, action))
                if !controller.is_empty() && !action.is_empty() && !action.contains('#') =>
            {
                Ok(Self {
                    controller: controller.to_string(),
                    action: action.to_string(),
                })
            }
            _ => Err(format!("`{}` is not of the form controller#action", s)),
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.controller, self.action)
    }
}

/// A handler as given at registration.
#[derive(Clone)]
pub enum HandlerRef {
    Handler(Arc<dyn Handler>),
    Action(String),
}

impl HandlerRef {
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&Params, &mut Context) -> ActionResult + Send + Sync + 'static,
    {
        HandlerRef::Handler(Arc::new(f))
    }

    pub fn handler<H: Handler + 'static>(handler: H) -> Self {
        HandlerRef::Handler(Arc::new(handler))
    }

    /// A `controller#action` reference, resolved when the route is registered.
    pub fn action(name: impl Into<String>) -> Self {
        HandlerRef::Action(name.into())
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Handler(_) => f.write_str("Handler(..)"),
            HandlerRef::Action(name) => f.debug_tuple("Action").field(name).finish(),
        }
    }
}

/// A resolved handler stored in the dispatch table.
#[derive(Clone)]
pub enum RouteHandler {
    Handler(Arc<dyn Handler>),
    Action {
        name: ActionName,
        handler: Arc<dyn Handler>,
    },
    /// Render a template with the route params as data.
    View { template: String },
}

impl RouteHandler {
    /// Short description for route listings.
    pub fn describe(&self) -> String {
        match self {
            RouteHandler::Handler(_) => "<closure>".to_string(),
            RouteHandler::Action { name, .. } => name.to_string(),
            RouteHandler::View { template } => format!("view:{}", template),
        }
    }

    /// Run the handler for a matched request.
    pub fn run(&self, params: &Params, ctx: &mut Context) -> ActionResult {
        match self {
            RouteHandler::Handler(handler) => handler.call(params, ctx),
            RouteHandler::Action { name, handler } => {
                if ctx.templates_sub_dir().is_none() {
                    ctx.set_templates_sub_dir(Some(name.controller().to_string()));
                }
                handler.call(params, ctx)?;

                if !ctx.is_halted() && !ctx.is_rendered(name.action()) {
                    tracing::debug!(action = %name, "Auto-rendering action template");
                    let _ = ctx.render(Render::template(name.action()))?;
                }
                Ok(())
            }
            RouteHandler::View { template } => {
                ctx.data_mut().extend(params.to_data());
                let _ = ctx.render(Render::template(template.as_str()))?;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
