//! Per-request render context.
//!
//! # Responsibilities
//! - Carry request data, matched params and the template scope
//! - Apply render options and buffer the response
//! - Receive helper calls from templates
//!
//! # Design Decisions
//! - The context is passed explicitly to handlers, never stored globally
//! - Halting is a returned `Flow`, checked by the caller

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::app::RequestInfo;
use crate::config::AppConfig;
use crate::observability::metrics;
use crate::render::helpers::HelperRegistry;
use crate::render::options::{Body, Render};
use crate::render::response::{ContentType, Response};
use crate::render::RenderError;
use crate::routing::{Params, RouteOptions};
use crate::template::{BindingContext, RenderTarget, TemplateCache, TemplateEngine, TemplatePolicy};

/// Whether request processing continues after a call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

impl Flow {
    pub fn is_halt(self) -> bool {
        self == Flow::Halt
    }
}

/// Render settings shared by every request of an application.
#[derive(Debug)]
pub struct Renderer {
    engine: TemplateEngine,
    default_layout: Option<String>,
    base_url: Option<String>,
    helpers: HelperRegistry,
}

impl Renderer {
    pub fn new(engine: TemplateEngine, default_layout: Option<String>) -> Self {
        Self {
            engine,
            default_layout,
            base_url: None,
            helpers: HelperRegistry::new(),
        }
    }

    /// Build the engine, layout and base URL from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let policy = TemplatePolicy::from_config(&config.templates);
        let engine = TemplateEngine::new(policy, TemplateCache::new(config.templates.cache));
        let layout = config.templates.layout.resolve(None);

        let renderer = Self::new(engine, layout);
        match &config.site.base_url {
            Some(base_url) => renderer.with_base_url(base_url),
            None => renderer,
        }
    }

    /// Base URL used by `url()`. A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_helpers(mut self, helpers: HelperRegistry) -> Self {
        self.helpers = helpers;
        self
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn default_layout(&self) -> Option<&str> {
        self.default_layout.as_deref()
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }
}

/// Everything a handler needs to produce a response.
#[derive(Debug)]
pub struct Context {
    renderer: Arc<Renderer>,
    request: RequestInfo,
    params: Params,
    data: Map<String, Value>,
    layout: Option<String>,
    templates_sub_dir: Option<String>,
    rendered: HashSet<String>,
    halted: bool,
    response: Response,
}

impl Context {
    /// A fresh context for a request matched with `params` under route `options`.
    pub fn new(
        renderer: Arc<Renderer>,
        request: RequestInfo,
        params: Params,
        options: &RouteOptions,
    ) -> Self {
        let layout = match &options.layout {
            Some(setting) => setting.resolve(renderer.default_layout()),
            None => renderer.default_layout().map(str::to_string),
        };

        Self {
            renderer,
            request,
            params,
            data: Map::new(),
            layout,
            templates_sub_dir: options.templates_sub_dir.clone(),
            rendered: HashSet::new(),
            halted: false,
            response: Response::default(),
        }
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The template scope used when a render sets no `data`.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    /// Bind `name` in the template scope.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(name.into(), value.into());
    }

    /// Layout applied to template renders that do not override it.
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn set_layout(&mut self, layout: Option<String>) {
        self.layout = layout;
    }

    pub fn templates_sub_dir(&self) -> Option<&str> {
        self.templates_sub_dir.as_deref()
    }

    pub fn set_templates_sub_dir(&mut self, sub_dir: Option<String>) {
        self.templates_sub_dir = sub_dir;
    }

    /// Whether template `name` has been rendered in this request.
    pub fn is_rendered(&self, name: &str) -> bool {
        self.rendered.contains(name)
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    /// Configured base URL, or one built from the request host.
    pub fn base_url(&self) -> String {
        match (&self.renderer.base_url, &self.request.host) {
            (Some(base_url), _) => base_url.clone(),
            (None, Some(host)) => format!("http://{}", host),
            (None, None) => String::new(),
        }
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        let base_url = self.base_url();
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", base_url, path)
        } else {
            format!("{}/{}", base_url, path)
        }
    }

    /// Respond with `302` to `url(path)` and halt.
    pub fn redirect(&mut self, path: &str) -> Flow {
        if self.halted {
            return Flow::Halt;
        }
        let location = self.url(path);
        tracing::debug!(location = %location, "Redirecting");
        self.response.status = 302;
        self.response.set_header("Location", location);
        self.halted = true;
        Flow::Halt
    }

    /// Ask the client to load `url(path)` after `seconds`, without halting.
    pub fn redirect_after(&mut self, path: &str, seconds: u64) {
        let target = self.url(path);
        self.response
            .set_header("Refresh", format!("{}; url={}", seconds, target));
    }

    /// Render and append to the response.
    ///
    /// Returns `Flow::Halt` when the request should stop. Calls made after a
    /// halt are ignored.
    pub fn render(&mut self, render: impl Into<Render>) -> Result<Flow, RenderError> {
        let render = render.into();
        if self.halted {
            tracing::debug!("Request already halted, render ignored");
            return Ok(Flow::Halt);
        }

        let body = render.body()?;
        match body {
            Body::Json(value) => {
                let text = serde_json::to_string_pretty(value)?;
                self.write(ContentType::Json, render.status, &text);
            }
            Body::Js(text) => self.write(ContentType::JavaScript, render.status, text),
            Body::Plain(text) => self.write(ContentType::Plain, render.status, text),
            Body::Html(text) => self.write(ContentType::Html, render.status, text),
            Body::Partial(name) => {
                let layout = render
                    .layout
                    .as_ref()
                    .and_then(|setting| setting.resolve(self.layout.as_deref()));
                let output = self.compose(name, layout.as_deref(), render.data.as_ref())?;
                self.write(ContentType::Html, render.status, &output);
            }
            Body::Template(name) => {
                if self.rendered.contains(name) {
                    tracing::debug!(template = name, "Template already rendered, skipped");
                } else {
                    let layout = match &render.layout {
                        Some(setting) => setting.resolve(self.layout.as_deref()),
                        None => self.layout.clone(),
                    };
                    let output = self.compose(name, layout.as_deref(), render.data.as_ref())?;
                    self.write(ContentType::Html, render.status, &output);
                    self.rendered.insert(name.to_string());
                }
            }
        }
        metrics::record_render(body.kind());

        if render.halts(&body) {
            self.halted = true;
            Ok(Flow::Halt)
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Render from a dynamic value plus optional overriding options.
    pub fn render_value(&mut self, value: Value, extra: Option<Value>) -> Result<Flow, RenderError> {
        let mut render = Render::from_value(value)?;
        if let Some(extra) = extra {
            render = render.merge(Render::from_value(extra)?);
        }
        self.render(render)
    }

    fn compose(
        &self,
        name: &str,
        layout: Option<&str>,
        data: Option<&Map<String, Value>>,
    ) -> Result<String, RenderError> {
        let target = RenderTarget::new(name)
            .layout(layout)
            .sub_dir(self.templates_sub_dir.as_deref());
        let data = data.unwrap_or(&self.data);
        let output = self
            .renderer
            .engine()
            .find_and_render(target, data, Some(self))?;
        Ok(output)
    }

    fn write(&mut self, content_type: ContentType, status: Option<u16>, text: &str) {
        if let Some(status) = status {
            self.response.status = status;
        }
        self.response.content_type = Some(content_type);
        self.response.body.push_str(text);
    }
}

impl BindingContext for Context {
    fn call_helper(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
        let arg = |i: usize| args.get(i).and_then(Value::as_str);

        let result = match name {
            "url" => Ok(Value::String(self.url(arg(0).unwrap_or_default()))),
            "base_url" => Ok(Value::String(self.base_url())),
            "param" => arg(0)
                .ok_or_else(|| "param() expects a name".to_string())
                .map(|n| self.params.get(n).map_or(Value::Null, Value::from)),
            "query" => arg(0)
                .ok_or_else(|| "query() expects a name".to_string())
                .map(|n| self.request.query(n).map_or(Value::Null, Value::from)),
            _ => return self.renderer.helpers().call(name, args),
        };
        Some(result)
    }
}
