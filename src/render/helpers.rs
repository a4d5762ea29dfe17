//! Application-registered template helpers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Signature of a helper callable from templates.
pub type HelperFn = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// Named helpers available to every template rendered by an application.
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, Arc<HelperFn>>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `helper` under `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Call helper `name`, or `None` if it is not registered.
    pub fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
        self.helpers.get(name).map(|helper| helper(args))
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.helpers.keys().collect();
        names.sort();
        f.debug_struct("HelperRegistry").field("helpers", &names).finish()
    }
}
