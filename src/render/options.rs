//! Render options.
//!
//! `Render` enumerates every option a render call understands. Built with the
//! constructor methods from Rust, or deserialized from a JSON value where
//! unknown keys are rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::render::RenderError;

/// Layout used when nothing else is configured.
pub const DEFAULT_LAYOUT: &str = "main";

/// A layout choice: a layout name, `false` for none, `true` for the inherited one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutSetting {
    Enabled(bool),
    Named(String),
}

impl LayoutSetting {
    /// The layout name this setting selects, given the inherited layout.
    pub fn resolve(&self, inherited: Option<&str>) -> Option<String> {
        match self {
            LayoutSetting::Named(name) => Some(name.clone()),
            LayoutSetting::Enabled(false) => None,
            LayoutSetting::Enabled(true) => Some(inherited.unwrap_or(DEFAULT_LAYOUT).to_string()),
        }
    }
}

impl Default for LayoutSetting {
    fn default() -> Self {
        LayoutSetting::Named(DEFAULT_LAYOUT.to_string())
    }
}

impl From<&str> for LayoutSetting {
    fn from(name: &str) -> Self {
        LayoutSetting::Named(name.to_string())
    }
}

impl From<bool> for LayoutSetting {
    fn from(enabled: bool) -> Self {
        LayoutSetting::Enabled(enabled)
    }
}

/// Options for a single render call.
///
/// At most one of `json`, `js`, `plain`, `html` and `partial` may be set.
/// Conflicting bodies are rejected by [`Render::body`], not ranked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Render {
    /// Template to render. Used when no other body kind is set.
    pub template: Option<String>,
    /// Layout override.
    pub layout: Option<LayoutSetting>,
    /// Template scope. Defaults to the context's data.
    pub data: Option<Map<String, Value>>,
    /// Respond with this value as pretty-printed JSON.
    pub json: Option<Value>,
    pub plain: Option<String>,
    pub html: Option<String>,
    pub js: Option<String>,
    /// Render a template without the default layout.
    pub partial: Option<String>,
    pub status: Option<u16>,
    /// Whether the request keeps going after this render.
    #[serde(rename = "continue")]
    pub continue_processing: Option<bool>,
}

/// The kind of body a render produces, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Body<'a> {
    Json(&'a Value),
    Js(&'a str),
    Plain(&'a str),
    Html(&'a str),
    Partial(&'a str),
    Template(&'a str),
}

impl Body<'_> {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Json(_) => "json",
            Body::Js(_) => "js",
            Body::Plain(_) => "plain",
            Body::Html(_) => "html",
            Body::Partial(_) => "partial",
            Body::Template(_) => "template",
        }
    }
}

impl Render {
    pub fn template(name: impl Into<String>) -> Self {
        Self {
            template: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn partial(name: impl Into<String>) -> Self {
        Self {
            partial: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn json(value: Value) -> Self {
        Self {
            json: Some(value),
            ..Self::default()
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            html: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn js(text: impl Into<String>) -> Self {
        Self {
            js: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: impl Into<LayoutSetting>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn without_layout(self) -> Self {
        self.with_layout(false)
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Keep processing the request after this render.
    pub fn and_continue(mut self) -> Self {
        self.continue_processing = Some(true);
        self
    }

    /// Stop processing the request after this render.
    pub fn and_halt(mut self) -> Self {
        self.continue_processing = Some(false);
        self
    }

    /// Parse dynamic options: a string names a template, an object lists options.
    pub fn from_value(value: Value) -> Result<Self, RenderError> {
        match value {
            Value::String(name) => Ok(Self::template(name)),
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| RenderError::InvalidArgument(e.to_string())),
            other => Err(RenderError::InvalidArgument(format!(
                "expected a template name or an options object, got {}",
                other
            ))),
        }
    }

    /// Overlay `extra`: every option it sets replaces the one in `self`.
    pub fn merge(self, extra: Render) -> Self {
        Self {
            template: extra.template.or(self.template),
            layout: extra.layout.or(self.layout),
            data: extra.data.or(self.data),
            json: extra.json.or(self.json),
            plain: extra.plain.or(self.plain),
            html: extra.html.or(self.html),
            js: extra.js.or(self.js),
            partial: extra.partial.or(self.partial),
            status: extra.status.or(self.status),
            continue_processing: extra.continue_processing.or(self.continue_processing),
        }
    }

    /// Validate the options and pick the body to produce.
    pub fn body(&self) -> Result<Body<'_>, RenderError> {
        if let Some(status) = self.status {
            if !(100..=599).contains(&status) {
                return Err(RenderError::InvalidArgument(format!(
                    "status {} is out of range",
                    status
                )));
            }
        }

        let bodies: Vec<Body<'_>> = [
            self.json.as_ref().map(Body::Json),
            self.js.as_deref().map(Body::Js),
            self.plain.as_deref().map(Body::Plain),
            self.html.as_deref().map(Body::Html),
            self.partial.as_deref().map(Body::Partial),
        ]
        .into_iter()
        .flatten()
        .collect();

        match bodies.as_slice() {
            [] => self
                .template
                .as_deref()
                .map(Body::Template)
                .ok_or_else(|| RenderError::InvalidArgument("nothing to render".to_string())),
            [body] => Ok(*body),
            many => {
                let kinds: Vec<_> = many.iter().map(Body::kind).collect();
                Err(RenderError::InvalidArgument(format!(
                    "conflicting bodies: {}",
                    kinds.join(", ")
                )))
            }
        }
    }

    /// Whether producing `body` ends the request. Partials continue by default,
    /// everything else halts.
    pub fn halts(&self, body: &Body<'_>) -> bool {
        match self.continue_processing {
            Some(keep_going) => !keep_going,
            None => !matches!(body, Body::Partial(_)),
        }
    }
}

impl From<&str> for Render {
    fn from(name: &str) -> Self {
        Render::template(name)
    }
}

impl From<String> for Render {
    fn from(name: String) -> Self {
        Render::template(name)
    }
}
