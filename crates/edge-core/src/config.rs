//! Route configuration.

use serde::{Deserialize, Serialize};

use crate::context::Method;

/// Configuration for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Exact path this route serves (e.g., "/api/projects").
    pub pattern: String,
    /// Handler function name.
    pub handler: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl RouteConfig {
    /// Create a new route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }

    /// Whether the route serves `path`. A single trailing slash is ignored.
    pub fn matches(&self, path: &str) -> bool {
        let trimmed = if path.len() > 1 {
            path.strip_suffix('/').unwrap_or(path)
        } else {
            path
        };
        trimmed == self.pattern
    }

    /// Whether `method` is accepted by this route.
    pub fn allows(&self, method: &Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }

    /// Value for the `Allow` header.
    pub fn allow_header(&self) -> String {
        self.methods.join(", ")
    }
}
