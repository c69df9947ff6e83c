//! Router core module - hot path for request dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use super::error::{ReverseError, RouteError};
use super::route::{Route, RouteHandler, RouteOptions};
use super::table::{RouteTable, Target};
use crate::handler::{handler_id, named, Handler, HandlerResult, Reply, SharedHandler, TerminalResponse};
use crate::resolver::{DeferredHandler, NullResolver, ResolveHandler};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Request, Response, RoutingContext};
use http::Method;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handler identities tried during one dispatch; inline for the common case
type TriedVec = SmallVec<[usize; 8]>;

/// Router-wide behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Redirect to the trailing-slash-toggled path when only that one matches
    pub try_slashes: bool,
    /// Turn raised terminal responses into the dispatch result instead of
    /// propagating them to the caller
    pub catch_raised_responses: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            try_slashes: false,
            catch_raised_responses: true,
        }
    }
}

impl From<RuntimeConfig> for RouterOptions {
    fn from(config: RuntimeConfig) -> Self {
        Self {
            try_slashes: config.try_slashes,
            catch_raised_responses: config.catch_raised_responses,
        }
    }
}

/// How [`Router::reverse`] finds the route to reverse
#[derive(Clone, Copy)]
pub enum RouteLookup<'a> {
    /// A registered route
    Route(&'a Route),
    /// A view name: a handler identifier or [`Handler::name`]
    Name(&'a str),
    /// A handler, compared by identity
    Handler(&'a SharedHandler),
}

impl<'a> From<&'a str> for RouteLookup<'a> {
    fn from(name: &'a str) -> Self {
        RouteLookup::Name(name)
    }
}

impl<'a> From<&'a Route> for RouteLookup<'a> {
    fn from(route: &'a Route) -> Self {
        RouteLookup::Route(route)
    }
}

impl<'a> From<&'a Arc<Route>> for RouteLookup<'a> {
    fn from(route: &'a Arc<Route>) -> Self {
        RouteLookup::Route(route.as_ref())
    }
}

impl<'a> From<&'a SharedHandler> for RouteLookup<'a> {
    fn from(handler: &'a SharedHandler) -> Self {
        RouteLookup::Handler(handler)
    }
}

impl std::fmt::Display for RouteLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteLookup::Route(route) => write!(f, "route {}", route.view_name()),
            RouteLookup::Name(name) => write!(f, "view name {}", name),
            RouteLookup::Handler(h) => write!(f, "handler {}", h.name()),
        }
    }
}

/// Ordered collection of routes plus a default handler.
///
/// Routes are kept sorted by descending priority; equal priorities keep
/// registration order. A router is built once and then shared read-only
/// across request threads. It is itself a [`Handler`], so routers nest.
pub struct Router {
    routes: Vec<Arc<Route>>,
    default: Option<SharedHandler>,
    options: RouterOptions,
    resolver: Arc<dyn ResolveHandler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Default handler answering 404 Not Found
#[must_use]
pub fn not_found_handler() -> SharedHandler {
    named("not_found", |_req: &mut Request| {
        Ok(Some(Reply::Response(Response::not_found())))
    })
}

impl Router {
    /// Router with a 404 default, default options and no resolver
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default: Some(not_found_handler()),
            options: RouterOptions::default(),
            resolver: Arc::new(NullResolver),
        }
    }

    /// Router with no default handler: unmatched requests yield no result
    #[must_use]
    pub fn bare() -> Self {
        Self {
            default: None,
            ..Self::new()
        }
    }

    /// Router with a 404 default and options taken from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().with_options(RuntimeConfig::from_env().into())
    }

    /// Build a router from a route table
    pub fn from_table(
        table: RouteTable,
        resolver: Arc<dyn ResolveHandler>,
    ) -> Result<Self, RouteError> {
        let mut router = Self::bare().with_resolver(resolver);
        router.apply_table(table)?;
        Ok(router)
    }

    /// Set the resolver used for handler identifiers
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ResolveHandler>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the default handler (`None` removes it)
    #[must_use]
    pub fn with_default(mut self, default: Option<SharedHandler>) -> Self {
        self.default = default;
        self
    }

    /// Replace all options
    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable alternate-slash redirects
    #[must_use]
    pub fn try_slashes(mut self, enabled: bool) -> Self {
        self.options.try_slashes = enabled;
        self
    }

    /// Enable or disable catching raised terminal responses
    #[must_use]
    pub fn catch_raised_responses(mut self, enabled: bool) -> Self {
        self.options.catch_raised_responses = enabled;
        self
    }

    /// Current options
    #[must_use]
    pub fn options(&self) -> RouterOptions {
        self.options
    }

    /// The default handler, if any
    #[must_use]
    pub fn default_handler(&self) -> Option<&SharedHandler> {
        self.default.as_ref()
    }

    /// Routes in dispatch order
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Register a route with default options
    pub fn route(
        &mut self,
        template: &str,
        target: impl Into<Target>,
    ) -> Result<Arc<Route>, RouteError> {
        self.add_route(Some(template), target, RouteOptions::default())
    }

    /// Register a route.
    ///
    /// `template` of `None` matches any path (or, when delegating, any path
    /// starting with `/`). A [`Target::Table`] is compiled into a child
    /// router sharing this router's resolver.
    ///
    /// The route is inserted before the first existing route with strictly
    /// lower priority.
    pub fn add_route(
        &mut self,
        template: Option<&str>,
        target: impl Into<Target>,
        options: RouteOptions,
    ) -> Result<Arc<Route>, RouteError> {
        let handler = match target.into() {
            Target::Handler(h) => RouteHandler::Concrete(h),
            Target::Named(identifier) => RouteHandler::Deferred(DeferredHandler::new(
                &identifier,
                Arc::clone(&self.resolver),
            )),
            Target::Router(router) => RouteHandler::Nested(router),
            Target::Table(table) => {
                let child = Router::from_table(table, Arc::clone(&self.resolver))?;
                RouteHandler::Nested(Arc::new(child))
            }
        };

        let route = Arc::new(Route::new(template, handler, options)?);
        let position = self
            .routes
            .iter()
            .position(|r| r.priority() < route.priority())
            .unwrap_or(self.routes.len());

        info!(
            template = ?template,
            view = %route.view_name(),
            priority = route.priority(),
            position = position,
            pattern = %route.pattern().as_str(),
            "Route registered"
        );

        self.routes.insert(position, Arc::clone(&route));
        Ok(route)
    }

    fn apply_table(&mut self, table: RouteTable) -> Result<(), RouteError> {
        if let Some(options) = table.options {
            self.options = options;
        }
        self.default = table.default;
        for entry in table.entries {
            self.add_route(entry.template.as_deref(), entry.target, entry.options)?;
        }
        Ok(())
    }

    /// Routes matching `req`, in dispatch order
    pub fn matches<'a>(
        &'a self,
        req: &'a Request,
        alternate: bool,
    ) -> impl Iterator<Item = &'a Arc<Route>> + 'a {
        self.routes
            .iter()
            .filter(move |route| route.matches(req, alternate))
    }

    /// First route matching `req`
    #[must_use]
    pub fn first_match(&self, req: &Request, alternate: bool) -> Option<&Arc<Route>> {
        self.first_match_context(&req.method, &req.context, alternate)
    }

    fn first_match_context(
        &self,
        method: &Method,
        ctx: &RoutingContext,
        alternate: bool,
    ) -> Option<&Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.match_context(method, ctx, alternate).is_some())
    }

    /// Dispatch a request.
    ///
    /// Routes are tried in order; the first whose handler answers wins.
    /// Otherwise, with `try_slashes`, a route matching the slash-toggled path
    /// (and not already tried) produces a 307 redirect. Otherwise the default
    /// handler runs. `Ok(None)` means nothing answered and there is no
    /// default.
    pub fn dispatch(&self, req: &mut Request) -> HandlerResult {
        if let Some(error) = req.decode_error() {
            warn!(
                path = %req.path_info(),
                error = %error,
                "Malformed request path"
            );
            return Ok(Some(Reply::Response(Response::bad_request(
                "Request path is not valid UTF-8",
            ))));
        }

        debug!(
            method = %req.method,
            script_name = %req.script_name(),
            path_info = %req.path_info(),
            routes_count = self.routes.len(),
            "Dispatch attempt"
        );

        let mut tried = TriedVec::new();
        for route in &self.routes {
            let Some(ctx) = route.match_context(&req.method, &req.context, false) else {
                continue;
            };
            match route.invoke(req, ctx) {
                Ok(Some(reply)) => return Ok(Some(reply)),
                Ok(None) => tried.push(route.handler_id()),
                Err(raised) => return self.raised(raised),
            }
        }

        if self.options.try_slashes {
            let alt = req.context.with_toggled_slash();
            if let Some(route) = self.first_match_context(&req.method, &alt, true) {
                if !tried.contains(&route.handler_id()) {
                    let location = req.url_for(&alt);
                    info!(
                        path_info = %req.path_info(),
                        location = %location,
                        view = %route.view_name(),
                        "Redirecting to alternate slash path"
                    );
                    return Ok(Some(Reply::Response(Response::redirect(&location))));
                }
            }
        }

        match &self.default {
            Some(default) => {
                debug!(
                    path_info = %req.path_info(),
                    default = %default.name(),
                    "No route answered, using default handler"
                );
                match default.call(req) {
                    Err(raised) => self.raised(raised),
                    other => other,
                }
            }
            None => {
                debug!(path_info = %req.path_info(), "No route answered and no default handler");
                Ok(None)
            }
        }
    }

    fn raised(&self, raised: TerminalResponse) -> HandlerResult {
        if self.options.catch_raised_responses {
            debug!(status = %raised.0.status, "Caught raised terminal response");
            Ok(Some(Reply::Response(raised.into_response())))
        } else {
            Err(raised)
        }
    }

    /// Build a path for a registered route.
    ///
    /// `vars` fill the template's placeholders; `suffix` is appended
    /// verbatim (typically the delegated remainder of a mount).
    pub fn reverse<'a>(
        &self,
        target: impl Into<RouteLookup<'a>>,
        vars: &HashMap<String, String>,
        suffix: Option<&str>,
    ) -> Result<String, ReverseError> {
        let target = target.into();
        let route = self
            .find_route(target)
            .ok_or_else(|| ReverseError::NotFound {
                target: target.to_string(),
            })?;
        let template = route
            .reverse_template()
            .ok_or_else(|| ReverseError::NotReversible {
                route: route.view_name().to_string(),
            })?;

        let mut path = template.format(vars)?;
        if let Some(suffix) = suffix {
            path.push_str(suffix);
        }
        Ok(path)
    }

    fn find_route(&self, target: RouteLookup<'_>) -> Option<&Arc<Route>> {
        match target {
            RouteLookup::Route(wanted) => self
                .routes
                .iter()
                .find(|route| std::ptr::eq(route.as_ref(), wanted)),
            RouteLookup::Name(name) => self.routes.iter().find(|route| route.view_name() == name),
            RouteLookup::Handler(handler) => {
                let wanted = handler_id(handler);
                self.routes
                    .iter()
                    .find(|route| route.handler_id() == wanted)
            }
        }
    }

    /// Log every registered route at info level
    pub fn dump_routes(&self) {
        info!(
            routes_count = self.routes.len(),
            try_slashes = self.options.try_slashes,
            catch_raised_responses = self.options.catch_raised_responses,
            "Routing table"
        );
        for route in &self.routes {
            info!(
                template = ?route.template(),
                view = %route.view_name(),
                priority = route.priority(),
                passthrough = route.is_passthrough(),
                "Route"
            );
        }
    }
}

impl Handler for Router {
    fn call(&self, req: &mut Request) -> HandlerResult {
        self.dispatch(req)
    }

    fn name(&self) -> &str {
        "router"
    }
}
