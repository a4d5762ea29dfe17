//! Route matching logic.
//!
//! # Responsibilities
//! - Apply a compiled pattern to a request path
//! - Bind captured values to parameter names in declaration order
//!
//! # Design Decisions
//! - No match is `None`, not an error; the router scans on
//! - Values stay raw strings (`"27"` is not coerced)
//! - Duplicate names keep every binding; lookup by name returns the last one

use serde_json::{Map, Value};

use crate::routing::pattern::RoutePattern;

/// Ordered parameter bindings produced by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Create empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `name`. With duplicate names the last binding wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Values in declaration order, as handed to positional handlers.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings as a template data map.
    pub fn to_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        for (name, value) in &self.entries {
            data.insert(name.clone(), Value::String(value.clone()));
        }
        data
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

impl RoutePattern {
    /// Match `path` against this pattern.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let captures = self.regex().captures(path)?;

        let mut params = Params::new();
        for (i, name) in self.param_names().iter().enumerate() {
            // Groups that did not participate bind as empty.
            let value = captures.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
            params.push(name.clone(), value);
        }
        Some(params)
    }

    /// Returns true if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.regex().is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(spec: &str) -> RoutePattern {
        RoutePattern::compile(spec).unwrap()
    }

    #[test]
    fn test_default_param_excludes_slash() {
        let pattern = compile("/track/:id");

        let params = pattern.match_path("/track/4d6172").unwrap();
        assert_eq!(params.get("id"), Some("4d6172"));

        assert!(pattern.match_path("/track/4d/61").is_none());
    }

    #[test]
    fn test_inline_pattern_overrides_default() {
        let pattern = compile("/artist/:age([0-9]{3})");

        let params = pattern.match_path("/artist/123").unwrap();
        assert_eq!(params.get("age"), Some("123"));

        assert!(pattern.match_path("/artist/12").is_none());
        assert!(pattern.match_path("/artist/abc").is_none());
        assert!(pattern.match_path("/artist/1234").is_none());
    }

    #[test]
    fn test_trailing_slash_is_optional() {
        let pattern = compile("/artist/:name");

        let plain = pattern.match_path("/artist/queen").unwrap();
        let slashed = pattern.match_path("/artist/queen/").unwrap();
        assert_eq!(plain, slashed);
        assert_eq!(plain.get("name"), Some("queen"));
    }

    #[test]
    fn test_values_follow_declaration_order() {
        let pattern = compile("/artist/:name/:album/:track([0-9]+)");
        let params = pattern.match_path("/artist/queen/innuendo/27").unwrap();

        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["name", "album", "track"]);
        let values: Vec<_> = params.values().collect();
        assert_eq!(values, ["queen", "innuendo", "27"]);
    }

    #[test]
    fn test_static_route_matches_with_empty_bindings() {
        let pattern = compile("/music/new");
        let params = pattern.match_path("/music/new").unwrap();
        assert!(params.is_empty());
        assert!(pattern.match_path("/music/new/extra").is_none());
    }

    #[test]
    fn test_anchored_at_both_ends() {
        let pattern = compile("/track/:id");
        assert!(!pattern.matches("/prefix/track/1"));
        assert!(!pattern.matches("/track/1/suffix"));
    }

    #[test]
    fn test_dash_and_word_characters() {
        let pattern = compile("/artist/:slug");
        assert_eq!(
            pattern.match_path("/artist/freddie-mercury_1").unwrap().get("slug"),
            Some("freddie-mercury_1")
        );
        assert!(pattern.match_path("/artist/a.b").is_none());
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let pattern = compile("/:id/:id");
        let params = pattern.match_path("/first/second").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some("second"));
        assert_eq!(params.to_data()["id"], "second");
    }

    #[test]
    fn test_params_from_iter() {
        let params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params.len(), 2);
    }
}
