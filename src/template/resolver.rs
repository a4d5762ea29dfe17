//! Template and layout path resolution.
//!
//! Three kinds of names are recognised for templates, first rule wins:
//! 1. `/shared/header`: starts with a slash, resolved under the root directory
//! 2. `show` with a sub-directory configured: `templates_dir/sub_dir/show`
//! 3. anything else, including `artists/show`: `templates_dir/artists/show`
//!
//! Layouts follow rule 1 and otherwise always live in `layouts_dir`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::TemplateConfig;
use crate::template::TemplateError;

/// Whether an identifier names a template or a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Template,
    Layout,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Template => f.write_str("template"),
            TemplateKind::Layout => f.write_str("layout"),
        }
    }
}

/// A resolved template file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateId {
    kind: TemplateKind,
    name: String,
    path: PathBuf,
}

impl TemplateId {
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// The logical name the identifier was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail with `NotFound` unless the file exists.
    pub fn ensure_exists(&self) -> Result<&Self, TemplateError> {
        if self.path.is_file() {
            Ok(self)
        } else {
            Err(self.not_found())
        }
    }

    pub(crate) fn not_found(&self) -> TemplateError {
        TemplateError::NotFound {
            kind: self.kind,
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Where templates and layouts are searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePolicy {
    pub root_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub templates_sub_dir: Option<String>,
    pub layouts_dir: PathBuf,
    pub extension: String,
}

impl TemplatePolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &TemplateConfig) -> Self {
        Self {
            root_dir: config.root_dir.clone(),
            templates_dir: relative(&config.templates_dir),
            templates_sub_dir: None,
            layouts_dir: relative(&config.layouts_dir),
            extension: config.extension.clone(),
        }
    }

    /// Copy of this policy searching `sub_dir` for bare names.
    pub fn with_sub_dir(&self, sub_dir: Option<&str>) -> Self {
        Self {
            templates_sub_dir: sub_dir.filter(|s| !s.is_empty()).map(str::to_string),
            ..self.clone()
        }
    }

    /// Resolve a template name to a file identifier.
    pub fn resolve_template(&self, name: &str) -> TemplateId {
        let file = self.with_extension(name);

        let path = if let Some(absolute) = file.strip_prefix('/') {
            self.root_dir.join(absolute)
        } else {
            let templates_root = self.root_dir.join(&self.templates_dir);
            match &self.templates_sub_dir {
                Some(sub_dir) if !file.contains('/') => templates_root.join(sub_dir).join(&file),
                _ => templates_root.join(&file),
            }
        };

        TemplateId {
            kind: TemplateKind::Template,
            name: name.to_string(),
            path,
        }
    }

    /// Resolve a layout name to a file identifier.
    pub fn resolve_layout(&self, name: &str) -> TemplateId {
        let file = self.with_extension(name);

        let path = match file.strip_prefix('/') {
            Some(absolute) => self.root_dir.join(absolute),
            None => self.root_dir.join(&self.layouts_dir).join(&file),
        };

        TemplateId {
            kind: TemplateKind::Layout,
            name: name.to_string(),
            path,
        }
    }

    /// Append the extension unless the name already ends with it.
    fn with_extension(&self, name: &str) -> String {
        if name.ends_with(&self.extension) {
            name.to_string()
        } else {
            format!("{}{}", name, self.extension)
        }
    }
}

// "/views" and "views" both mean a directory under the root.
fn relative(dir: &str) -> PathBuf {
    PathBuf::from(dir.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TemplatePolicy {
        TemplatePolicy {
            root_dir: PathBuf::from("/srv/app"),
            templates_dir: PathBuf::from("views"),
            templates_sub_dir: None,
            layouts_dir: PathBuf::from("views/layouts"),
            extension: ".html.tpl".to_string(),
        }
    }

    #[test]
    fn test_bare_name() {
        let id = policy().resolve_template("index");
        assert_eq!(id.path(), Path::new("/srv/app/views/index.html.tpl"));
        assert_eq!(id.kind(), TemplateKind::Template);
        assert_eq!(id.name(), "index");
    }

    #[test]
    fn test_bare_name_uses_sub_dir() {
        let id = policy().with_sub_dir(Some("artists")).resolve_template("show");
        assert_eq!(id.path(), Path::new("/srv/app/views/artists/show.html.tpl"));
    }

    #[test]
    fn test_nested_name_ignores_sub_dir() {
        let id = policy()
            .with_sub_dir(Some("artists"))
            .resolve_template("albums/show");
        assert_eq!(id.path(), Path::new("/srv/app/views/albums/show.html.tpl"));
    }

    #[test]
    fn test_absolute_name_resolves_under_root() {
        let id = policy()
            .with_sub_dir(Some("artists"))
            .resolve_template("/shared/header");
        assert_eq!(id.path(), Path::new("/srv/app/shared/header.html.tpl"));
    }

    #[test]
    fn test_extension_not_doubled() {
        let id = policy().resolve_template("index.html.tpl");
        assert_eq!(id.path(), Path::new("/srv/app/views/index.html.tpl"));

        let id = policy().resolve_template("/shared/footer.html.tpl");
        assert_eq!(id.path(), Path::new("/srv/app/shared/footer.html.tpl"));
    }

    #[test]
    fn test_layout_ignores_sub_dir() {
        let id = policy().with_sub_dir(Some("artists")).resolve_layout("main");
        assert_eq!(id.path(), Path::new("/srv/app/views/layouts/main.html.tpl"));
        assert_eq!(id.kind(), TemplateKind::Layout);

        let id = policy().resolve_layout("/themes/dark");
        assert_eq!(id.path(), Path::new("/srv/app/themes/dark.html.tpl"));
    }

    #[test]
    fn test_empty_sub_dir_is_none() {
        let id = policy().with_sub_dir(Some("")).resolve_template("show");
        assert_eq!(id.path(), Path::new("/srv/app/views/show.html.tpl"));
    }

    #[test]
    fn test_from_config_strips_leading_slash() {
        let config = TemplateConfig {
            root_dir: PathBuf::from("/srv/app"),
            templates_dir: "/views".to_string(),
            layouts_dir: "/views/layouts".to_string(),
            ..TemplateConfig::default()
        };
        let policy = TemplatePolicy::from_config(&config);
        assert_eq!(policy.templates_dir, PathBuf::from("views"));
        assert_eq!(
            policy.resolve_layout("main").path(),
            Path::new("/srv/app/views/layouts/main.html.tpl")
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let id = policy().resolve_template("definitely-missing");
        let err = id.ensure_exists().unwrap_err();
        assert!(err.is_not_found());
    }
}
