//! Layout + content composition.
//!
//! # Responsibilities
//! - Load the content template and the optional layout
//! - Render content first, then the layout with the same scope and context
//! - Splice the content into the layout at the `{{yield}}` marker
//!
//! # Design Decisions
//! - Only the first marker is replaced; later ones stay as literal text
//! - Both units are loaded before rendering, a missing layout produces no output
//! - A layout without a marker renders alone (logged at warn)

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::template::cache::TemplateCache;
use crate::template::compiler::{BindingContext, RenderingUnit};
use crate::template::resolver::TemplatePolicy;
use crate::template::TemplateError;

/// Marker in a layout replaced by the rendered content.
pub const YIELD_MARKER: &str = "{{yield}}";

/// Compose rendered content into an optional layout.
pub fn compose(
    layout: Option<&RenderingUnit>,
    content: &RenderingUnit,
    data: &Map<String, Value>,
    context: Option<&dyn BindingContext>,
) -> Result<String, TemplateError> {
    let body = content.render(data, context)?;

    let Some(layout) = layout else {
        return Ok(body);
    };

    let frame = layout.render(data, context)?;
    if !frame.contains(YIELD_MARKER) {
        tracing::warn!(
            layout = %layout.path().display(),
            marker = YIELD_MARKER,
            "Layout has no yield marker, content dropped"
        );
    }
    Ok(frame.replacen(YIELD_MARKER, &body, 1))
}

/// What to render: a template name, an optional layout and sub-directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderTarget<'a> {
    pub template: &'a str,
    pub layout: Option<&'a str>,
    pub templates_sub_dir: Option<&'a str>,
}

impl<'a> RenderTarget<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    pub fn layout(mut self, layout: Option<&'a str>) -> Self {
        self.layout = layout;
        self
    }

    pub fn sub_dir(mut self, sub_dir: Option<&'a str>) -> Self {
        self.templates_sub_dir = sub_dir;
        self
    }
}

/// Resolves, caches and composes templates under one policy.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    policy: TemplatePolicy,
    cache: TemplateCache,
}

impl TemplateEngine {
    pub fn new(policy: TemplatePolicy, cache: TemplateCache) -> Self {
        Self { policy, cache }
    }

    pub fn policy(&self) -> &TemplatePolicy {
        &self.policy
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Load the compiled template `name`, searching `sub_dir` for bare names.
    pub fn load_template(
        &self,
        name: &str,
        sub_dir: Option<&str>,
    ) -> Result<Arc<RenderingUnit>, TemplateError> {
        let id = self.policy.with_sub_dir(sub_dir).resolve_template(name);
        self.cache.get_or_compile(&id)
    }

    /// Load the compiled layout `name`.
    pub fn load_layout(&self, name: &str) -> Result<Arc<RenderingUnit>, TemplateError> {
        let id = self.policy.resolve_layout(name);
        self.cache.get_or_compile(&id)
    }

    /// Find the target's template and layout, then compose them.
    pub fn find_and_render(
        &self,
        target: RenderTarget<'_>,
        data: &Map<String, Value>,
        context: Option<&dyn BindingContext>,
    ) -> Result<String, TemplateError> {
        let content = self.load_template(target.template, target.templates_sub_dir)?;
        let layout = target
            .layout
            .map(|name| self.load_layout(name))
            .transpose()?;

        compose(layout.as_deref(), &content, data, context)
    }
}
