pub mod handler;
pub mod walker;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;

pub use handler::{Handler, ViewDoc};
pub use walker::{RouteSpecs, WalkOptions, walk_routes};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Key used for this verb inside a path item.
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown HTTP method: {s}"))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A registered URL rule, as reported by the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Native URL rule, e.g. `/pets/<int:pet_id>`.
    pub rule: String,
    /// Endpoint name the handler is registered under.
    pub endpoint: String,
    pub methods: BTreeSet<HttpMethod>,
}

impl Route {
    pub fn new(
        rule: impl Into<String>,
        endpoint: impl Into<String>,
        methods: impl IntoIterator<Item = HttpMethod>,
    ) -> Self {
        Self {
            rule: rule.into(),
            endpoint: endpoint.into(),
            methods: methods.into_iter().collect(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rule)
    }
}

/// Read access to an application's routing table and view registry.
pub trait RouteSource: Send + Sync {
    /// Every registered route, in registration order.
    fn routes(&self) -> Vec<Route>;

    /// The handler registered under `endpoint`.
    fn handler(&self, endpoint: &str) -> Option<&Handler>;
}

/// In-memory routing table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    handlers: IndexMap<String, Handler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `endpoint` and bind `rule` to it.
    pub fn add(
        &mut self,
        rule: &str,
        endpoint: &str,
        methods: impl IntoIterator<Item = HttpMethod>,
        handler: Handler,
    ) -> &mut Self {
        self.routes.push(Route::new(rule, endpoint, methods));
        self.handlers.insert(endpoint.to_string(), handler);
        self
    }

    /// Bind an additional rule to an already registered endpoint.
    pub fn add_rule(
        &mut self,
        rule: &str,
        endpoint: &str,
        methods: impl IntoIterator<Item = HttpMethod>,
    ) -> &mut Self {
        self.routes.push(Route::new(rule, endpoint, methods));
        self
    }
}

impl RouteSource for RouteTable {
    fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }

    fn handler(&self, endpoint: &str) -> Option<&Handler> {
        self.handlers.get(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_methods_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("OPTIONS".parse::<HttpMethod>().unwrap(), HttpMethod::Options);
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn deserializes_from_yaml_strings() {
        let methods: Vec<HttpMethod> = serde_yaml_ng::from_str("[HEAD, post]").unwrap();
        assert_eq!(methods, vec![HttpMethod::Head, HttpMethod::Post]);
    }

    #[test]
    fn route_table_keeps_registration_order() {
        let mut table = RouteTable::new();
        table
            .add("/b", "b", [HttpMethod::Get], Handler::Function(ViewDoc::new("b")))
            .add("/a", "a", [HttpMethod::Get], Handler::Function(ViewDoc::new("a")));
        let rules: Vec<String> = table.routes().into_iter().map(|r| r.rule).collect();
        assert_eq!(rules, vec!["/b", "/a"]);
        assert!(table.handler("a").is_some());
        assert!(table.handler("c").is_none());
    }
}
