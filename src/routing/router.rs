//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first entry matching method and path
//! - Return the matched entry or explicit no-match
//!
//! # Design Decisions
//! - Immutable once published (shared via Arc without locks)
//! - O(n) scan; registration order is the only precedence
//! - Explicit NotFound rather than silent default

use axum::http::Method;

use crate::render::LayoutSetting;
use crate::routing::matcher::Params;
use crate::routing::pattern::{PatternError, RoutePattern};

/// Per-route render options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteOptions {
    /// Layout override for renders made while handling this route.
    pub layout: Option<LayoutSetting>,
    /// Sub-directory searched for bare template names.
    pub templates_sub_dir: Option<String>,
}

/// A registered route.
#[derive(Debug)]
pub struct DispatchEntry<H> {
    method: Method,
    pattern: RoutePattern,
    handler: H,
    options: RouteOptions,
}

impl<H> DispatchEntry<H> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }
}

/// Result of a table lookup.
#[derive(Debug)]
pub enum Dispatch<'a, H> {
    /// First entry whose method and pattern matched.
    Matched {
        entry: &'a DispatchEntry<H>,
        params: Params,
    },
    /// No entry matched.
    NotFound,
}

/// Ordered route table with first-match-wins lookup.
#[derive(Debug)]
pub struct DispatchTable<H> {
    entries: Vec<DispatchEntry<H>>,
}

impl<H> DispatchTable<H> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Compile `spec` and append an entry.
    ///
    /// Nothing is appended when the spec fails to compile.
    pub fn register(
        &mut self,
        method: Method,
        spec: &str,
        handler: H,
        options: RouteOptions,
    ) -> Result<&DispatchEntry<H>, PatternError> {
        let pattern = RoutePattern::compile(spec)?;

        tracing::debug!(
            method = %method,
            route = %spec,
            expression = %pattern.expression(),
            params = ?pattern.param_names(),
            "Route registered"
        );

        let index = self.entries.len();
        self.entries.push(DispatchEntry {
            method,
            pattern,
            handler,
            options,
        });
        Ok(&self.entries[index])
    }

    /// Find the first entry matching `method` and `path`.
    pub fn dispatch(&self, method: &Method, path: &str) -> Dispatch<'_, H> {
        for entry in &self.entries {
            if entry.method != *method {
                continue;
            }
            if let Some(params) = entry.pattern.match_path(path) {
                return Dispatch::Matched { entry, params };
            }
        }
        Dispatch::NotFound
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[DispatchEntry<H>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H> Default for DispatchTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(routes: &[(Method, &str, &'static str)]) -> DispatchTable<&'static str> {
        let mut table = DispatchTable::new();
        for (method, spec, handler) in routes {
            table
                .register(method.clone(), spec, *handler, RouteOptions::default())
                .unwrap();
        }
        table
    }

    #[test]
    fn test_first_registered_match_wins() {
        let table = table(&[
            (Method::GET, "/artist/:name", "by_name"),
            (Method::GET, "/artist/:id([0-9]+)", "by_id"),
        ]);

        match table.dispatch(&Method::GET, "/artist/42") {
            Dispatch::Matched { entry, params } => {
                assert_eq!(*entry.handler(), "by_name");
                assert_eq!(params.get("name"), Some("42"));
            }
            Dispatch::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn test_method_must_match() {
        let table = table(&[
            (Method::POST, "/artists", "create"),
            (Method::GET, "/artists", "index"),
        ]);

        match table.dispatch(&Method::GET, "/artists") {
            Dispatch::Matched { entry, .. } => assert_eq!(*entry.handler(), "index"),
            Dispatch::NotFound => panic!("expected a match"),
        }
        assert!(matches!(
            table.dispatch(&Method::DELETE, "/artists"),
            Dispatch::NotFound
        ));
    }

    #[test]
    fn test_not_found() {
        let table = table(&[(Method::GET, "/artists", "index")]);
        assert!(matches!(
            table.dispatch(&Method::GET, "/albums"),
            Dispatch::NotFound
        ));
    }

    #[test]
    fn test_failed_compile_registers_nothing() {
        let mut table: DispatchTable<&str> = DispatchTable::new();
        let result = table.register(
            Method::GET,
            "/artist/:age([0-9]",
            "broken",
            RouteOptions::default(),
        );
        assert!(result.is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_entries_keep_registration_order() {
        let table = table(&[
            (Method::GET, "/b", "b"),
            (Method::GET, "/a", "a"),
            (Method::GET, "/c", "c"),
        ]);
        let order: Vec<_> = table.entries().iter().map(|e| *e.handler()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }
}
