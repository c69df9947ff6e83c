use super::core::{Router, RouterOptions};
use super::route::RouteOptions;
use crate::handler::SharedHandler;
use std::fmt;
use std::sync::Arc;

/// What a route dispatches to
pub enum Target {
    /// A callable
    Handler(SharedHandler),
    /// A `"namespace:name"` identifier resolved on first use
    Named(String),
    /// A nested route table, compiled into a child router
    Table(RouteTable),
    /// An already built child router
    Router(Arc<Router>),
}

impl From<SharedHandler> for Target {
    fn from(h: SharedHandler) -> Self {
        Target::Handler(h)
    }
}

impl From<&str> for Target {
    fn from(identifier: &str) -> Self {
        Target::Named(identifier.to_string())
    }
}

impl From<String> for Target {
    fn from(identifier: String) -> Self {
        Target::Named(identifier)
    }
}

impl From<RouteTable> for Target {
    fn from(table: RouteTable) -> Self {
        Target::Table(table)
    }
}

impl From<Router> for Target {
    fn from(router: Router) -> Self {
        Target::Router(Arc::new(router))
    }
}

impl From<Arc<Router>> for Target {
    fn from(router: Arc<Router>) -> Self {
        Target::Router(router)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Handler(h) => f.debug_tuple("Handler").field(&h.name()).finish(),
            Target::Named(id) => f.debug_tuple("Named").field(id).finish(),
            Target::Table(t) => f.debug_tuple("Table").field(t).finish(),
            Target::Router(r) => f.debug_tuple("Router").field(&r.routes().len()).finish(),
        }
    }
}

/// One entry of a [`RouteTable`]
#[derive(Debug)]
pub struct RouteEntry {
    /// Path template; `None` matches any path
    pub template: Option<String>,
    /// Handler, identifier or nested table
    pub target: Target,
    /// Per-route options
    pub options: RouteOptions,
}

/// A declarative route list, optionally carrying router options.
///
/// Used as a route target it becomes a child router sharing the parent's
/// resolver. A child has no default handler unless one is set here, so an
/// unmatched lookup inside it lets the parent carry on with its own routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Routes in registration order
    pub entries: Vec<RouteEntry>,
    /// Options for the router built from this table
    pub options: Option<RouterOptions>,
    /// Default handler for the router built from this table
    pub default: Option<SharedHandler>,
}

impl RouteTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route with default options
    #[must_use]
    pub fn route(self, template: &str, target: impl Into<Target>) -> Self {
        self.route_with(Some(template), target, RouteOptions::default())
    }

    /// Append a route with explicit options
    #[must_use]
    pub fn route_with(
        mut self,
        template: Option<&str>,
        target: impl Into<Target>,
        options: RouteOptions,
    ) -> Self {
        self.entries.push(RouteEntry {
            template: template.map(str::to_string),
            target: target.into(),
            options,
        });
        self
    }

    /// Set the options of the router built from this table
    #[must_use]
    pub fn options(mut self, options: RouterOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the default handler of the router built from this table
    #[must_use]
    pub fn default_handler(mut self, handler: SharedHandler) -> Self {
        self.default = Some(handler);
        self
    }
}
