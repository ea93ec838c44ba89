//! Route registry
//!
//! The set of routes the host server currently serves. The policy builder
//! reads it to discover segments; the gate compiles it into a
//! [`RouteTable`](crate::policy::RouteTable).

use crate::config::RouteConfig;
use crate::policy::RouteTable;
use serde::Serialize;

/// A route the host has registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredRoute {
    /// Path pattern, possibly with regex parameter groups
    pub pattern: String,
    /// Methods the handler accepts (metadata only; admission ignores it)
    pub methods: Vec<String>,
}

impl RegisteredRoute {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }
}

/// Source of the live route set
pub trait RouteRegistry: Send + Sync {
    /// Registered routes, in registration order.
    fn routes(&self) -> Vec<RegisteredRoute>;

    /// Patterns only, in registration order.
    fn patterns(&self) -> Vec<String> {
        self.routes().into_iter().map(|r| r.pattern).collect()
    }

    /// Compile the current route set for matching.
    fn route_table(&self) -> RouteTable {
        RouteTable::new(self.patterns())
    }
}

/// Fixed route set, typically from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    routes: Vec<RegisteredRoute>,
}

impl StaticRegistry {
    pub fn new(routes: Vec<RegisteredRoute>) -> Self {
        Self { routes }
    }

    pub fn from_config(routes: &[RouteConfig]) -> Self {
        Self::new(
            routes
                .iter()
                .map(|r| RegisteredRoute::new(&r.pattern).with_methods(r.methods.iter().cloned()))
                .collect(),
        )
    }
}

impl RouteRegistry for StaticRegistry {
    fn routes(&self) -> Vec<RegisteredRoute> {
        self.routes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_registry_keeps_order() {
        let registry = StaticRegistry::new(vec![
            RegisteredRoute::new("/b"),
            RegisteredRoute::new("/a").with_methods(["GET", "POST"]),
        ]);
        assert_eq!(registry.patterns(), vec!["/b", "/a"]);
        assert_eq!(registry.routes()[1].methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_from_config() {
        let registry = StaticRegistry::from_config(&[RouteConfig {
            pattern: "/wp/v2/posts".to_string(),
            methods: vec!["GET".to_string()],
        }]);
        let table = registry.route_table();
        assert_eq!(table.find_match("/wp/v2/posts"), Some("/wp/v2/posts"));
    }
}
