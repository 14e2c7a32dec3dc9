//! The fixed list of client methods that get traced.
//!
//! Install and remove both walk [`WRAPPED_METHODS`]; nothing else decides
//! which calls are instrumented.

use std::fmt;

/// Which client call site a target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Legacy single-prompt text completion.
    Completions,
    /// Multi-turn Messages API.
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedMethod {
    pub package: &'static str,
    pub object: &'static str,
    pub method: &'static str,
    pub span_name: &'static str,
    pub endpoint: Endpoint,
}

impl WrappedMethod {
    /// `package.object.method`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.package, self.object, self.method)
    }
}

impl fmt::Display for WrappedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.qualified_name(), self.span_name)
    }
}

pub static WRAPPED_METHODS: [WrappedMethod; 2] = [
    WrappedMethod {
        package: "anthropic.resources.completions",
        object: "Completions",
        method: "create",
        span_name: "anthropic.completion",
        endpoint: Endpoint::Completions,
    },
    WrappedMethod {
        package: "anthropic.resources.messages",
        object: "Messages",
        method: "create",
        span_name: "anthropic.completion",
        endpoint: Endpoint::Messages,
    },
];

pub fn lookup(endpoint: Endpoint) -> Option<&'static WrappedMethod> {
    WRAPPED_METHODS.iter().find(|m| m.endpoint == endpoint)
}
