//! Template directory watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::template::cache::TemplateCache;
use crate::template::resolver::TemplatePolicy;

/// A watcher that drops compiled templates when template files under the
/// root directory change.
///
/// The whole root is watched so absolute names such as `/partials/badge`
/// reload as well; events for files without the template extension are ignored.
pub struct TemplateWatcher {
    root: PathBuf,
    extension: String,
    cache: TemplateCache,
}

impl TemplateWatcher {
    pub fn new(policy: &TemplatePolicy, cache: TemplateCache) -> Self {
        Self {
            root: policy.root_dir.clone(),
            extension: policy.extension.clone(),
            cache,
        }
    }

    /// Directory that will be watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a change to `path` can affect a compiled template.
    pub fn is_template(&self, path: &Path) -> bool {
        is_template(&self.extension, path)
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let cache = self.cache.clone();
        let extension = self.extension.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify()
                        || event.kind.is_create()
                        || event.kind.is_remove();
                    if relevant && event.paths.iter().any(|p| is_template(&extension, p)) {
                        tracing::info!(paths = ?event.paths, "Template change detected, clearing cache");
                        cache.clear();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = %self.root.display(), "Template watcher started");
        Ok(watcher)
    }
}

fn is_template(extension: &str, path: &Path) -> bool {
    path.to_str().is_some_and(|p| p.ends_with(extension))
}
