//! Declarative route-table files.
//!
//! A route table can be kept in YAML (`.yaml` / `.yml`) or JSON and loaded
//! into a [`Router`]. Handlers are named by identifier and resolved lazily
//! through the resolver passed to [`load_router`].
//!
//! ```yaml
//! options:
//!   try_slashes: true
//! default: "errors:not_found"
//! routes:
//!   - path: "/"
//!     handler: "pages:home"
//!   - path: "/pets/{id:\\d+}"
//!     handler: "pets:get"
//!     methods: [GET]
//!   - path: "/admin"
//!     delegate: anything
//!     routes:
//!       - path: "/settings"
//!         handler: "admin:settings"
//! ```

use crate::handler::SharedHandler;
use crate::resolver::{DeferredHandler, ResolveHandler};
use crate::router::{
    not_found_handler, DelegatePath, RouteError, RouteOptions, RouteTable, Router, RouterOptions,
    Target,
};
use crate::runtime_config::RuntimeConfig;
use anyhow::Context;
use http::Method;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Literal accepted by `delegate:` for "slash followed by anything"
pub const DELEGATE_ANYTHING: &str = "anything";

/// Top level of a route-table file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTableConfig {
    /// Router options; the environment defaults apply when absent
    #[serde(default)]
    pub options: Option<RouterOptions>,
    /// Identifier of the default handler; a 404 handler when absent
    #[serde(default)]
    pub default: Option<String>,
    /// Routes in registration order
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// One route of a route-table file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Path template; absent matches any path
    #[serde(default)]
    pub path: Option<String>,
    /// Handler identifier (`namespace:name`)
    #[serde(default)]
    pub handler: Option<String>,
    /// Nested routes, mounted as a child router
    #[serde(default)]
    pub routes: Option<Vec<RouteConfig>>,
    /// Options of the nested router
    #[serde(default)]
    pub options: Option<RouterOptions>,
    /// Default handler identifier of the nested router
    #[serde(default)]
    pub default: Option<String>,
    /// Accepted methods
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    /// Static variables
    #[serde(default)]
    pub vars: Option<HashMap<String, String>>,
    /// Priority; higher runs earlier
    #[serde(default)]
    pub priority: i32,
    /// `anything` or a regex for the delegated remainder
    #[serde(default)]
    pub delegate: Option<String>,
    /// Hand the handler back to the caller instead of invoking it
    #[serde(default)]
    pub passthrough: bool,
    /// Exclude from alternate-slash redirects
    #[serde(default)]
    pub no_alt_redirect: bool,
}

impl RouteConfig {
    fn route_options(&self) -> Result<RouteOptions, RouteError> {
        let methods = match &self.methods {
            Some(names) => Some(
                names
                    .iter()
                    .map(|name| parse_method(name))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        let delegate = self.delegate.as_deref().map(|d| match d {
            DELEGATE_ANYTHING => DelegatePath::Anything,
            expr => DelegatePath::Pattern(expr.to_string()),
        });
        Ok(RouteOptions {
            vars: self.vars.clone(),
            methods,
            no_alt_redirect: self.no_alt_redirect,
            delegate,
            passthrough: self.passthrough,
            priority: self.priority,
        })
    }

    fn target(&self, resolver: &Arc<dyn ResolveHandler>) -> Result<Target, RouteError> {
        match (&self.handler, &self.routes) {
            (Some(_), None) if self.options.is_some() || self.default.is_some() => {
                Err(RouteError::InvalidOption {
                    message: format!(
                        "route {:?} sets options or default without nested routes",
                        self.path.as_deref().unwrap_or("<any>")
                    ),
                })
            }
            (Some(handler), None) => Ok(Target::Named(handler.clone())),
            (None, Some(routes)) => Ok(Target::Table(build_table(
                routes,
                self.options,
                self.default.as_deref(),
                resolver,
            )?)),
            (Some(_), Some(_)) => Err(RouteError::InvalidOption {
                message: format!(
                    "route {:?} sets both handler and routes",
                    self.path.as_deref().unwrap_or("<any>")
                ),
            }),
            (None, None) => Err(RouteError::InvalidOption {
                message: format!(
                    "route {:?} needs a handler or nested routes",
                    self.path.as_deref().unwrap_or("<any>")
                ),
            }),
        }
    }
}

fn parse_method(name: &str) -> Result<Method, RouteError> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).map_err(|e| {
        RouteError::InvalidOption {
            message: format!("invalid method {name:?}: {e}"),
        }
    })
}

fn deferred(identifier: &str, resolver: &Arc<dyn ResolveHandler>) -> SharedHandler {
    Arc::new(DeferredHandler::new(identifier, Arc::clone(resolver)))
}

fn build_table(
    routes: &[RouteConfig],
    options: Option<RouterOptions>,
    default: Option<&str>,
    resolver: &Arc<dyn ResolveHandler>,
) -> Result<RouteTable, RouteError> {
    let mut table = RouteTable {
        entries: Vec::with_capacity(routes.len()),
        options,
        default: default.map(|id| deferred(id, resolver)),
    };
    for route in routes {
        table = table.route_with(
            route.path.as_deref(),
            route.target(resolver)?,
            route.route_options()?,
        );
    }
    Ok(table)
}

impl RouteTableConfig {
    /// Parse YAML text
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse route table YAML")
    }

    /// Parse JSON text
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("Failed to parse route table JSON")
    }

    /// Build a router, resolving identifiers through `resolver`.
    ///
    /// Options not given in the file come from [`RuntimeConfig::from_env`].
    pub fn into_router(self, resolver: Arc<dyn ResolveHandler>) -> Result<Router, RouteError> {
        self.into_router_with(resolver, RuntimeConfig::from_env().into())
    }

    /// Build a router with explicit fallback options
    pub fn into_router_with(
        self,
        resolver: Arc<dyn ResolveHandler>,
        fallback: RouterOptions,
    ) -> Result<Router, RouteError> {
        let options = self.options.unwrap_or(fallback);
        let mut table = build_table(&self.routes, Some(options), None, &resolver)?;
        table.default = self.default.as_deref().map(|id| deferred(id, &resolver));

        let custom_default = table.default.is_some();
        let router = Router::from_table(table, resolver)?;
        if custom_default {
            Ok(router)
        } else {
            Ok(router.with_default(Some(not_found_handler())))
        }
    }
}

/// Read a route-table file; YAML by extension, JSON otherwise
pub fn load_route_table(path: &Path) -> anyhow::Result<RouteTableConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read route table {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        RouteTableConfig::from_yaml(&content)
    } else {
        RouteTableConfig::from_json(&content)
    }
}

/// Read a route-table file and build a router from it
pub fn load_router(path: &Path, resolver: Arc<dyn ResolveHandler>) -> anyhow::Result<Router> {
    let config = load_route_table(path)?;
    let router = config
        .into_router(resolver)
        .with_context(|| format!("Invalid route table {}", path.display()))?;
    info!(
        path = %path.display(),
        routes_count = router.routes().len(),
        "Route table loaded"
    );
    Ok(router)
}
