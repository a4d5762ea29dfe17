//! Compiled template caching.
//!
//! # Responsibilities
//! - Hand out one shared `RenderingUnit` per resolved file
//! - Compile on first use, at most once per file under concurrent access
//! - Drop compiled units when templates change on disk

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::observability::metrics;
use crate::template::compiler::{compile, RenderingUnit};
use crate::template::{TemplateError, TemplateId};

type Slot = Arc<OnceCell<Arc<RenderingUnit>>>;

/// A thread-safe cache of compiled templates keyed by file path.
#[derive(Debug, Clone)]
pub struct TemplateCache {
    /// Each path owns an init cell; the map lock is only held to fetch the cell,
    /// compilation runs under the cell's own lock.
    inner: Arc<DashMap<PathBuf, Slot>>,
    enabled: bool,
}

impl TemplateCache {
    /// Create an empty cache. A disabled cache compiles on every call.
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            enabled,
        }
    }

    /// Return the compiled unit for `id`, compiling it on first use.
    pub fn get_or_compile(&self, id: &TemplateId) -> Result<Arc<RenderingUnit>, TemplateError> {
        if !self.enabled {
            metrics::record_template_load("uncached");
            return compile(id).map(Arc::new);
        }

        let slot: Slot = self
            .inner
            .entry(id.path().to_path_buf())
            .or_default()
            .clone();

        if let Some(unit) = slot.get() {
            metrics::record_template_load("hit");
            return Ok(unit.clone());
        }

        let result = slot.get_or_try_init(|| {
            metrics::record_template_load("miss");
            compile(id).map(Arc::new)
        });
        match result {
            Ok(unit) => Ok(unit.clone()),
            Err(e) => {
                // Failed lookups keep no slot.
                self.inner.remove_if(id.path(), |_, s| s.get().is_none());
                Err(e)
            }
        }
    }

    /// Drop every compiled unit.
    pub fn clear(&self) {
        let dropped = self.inner.len();
        self.inner.clear();
        tracing::debug!(dropped, "Template cache cleared");
    }

    /// Number of files with a cache slot.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
