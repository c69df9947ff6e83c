use super::core::Router;
use super::error::RouteError;
use super::template::{compile_template, DelegatePath, ReverseTemplate, DELEGATE_GROUP};
use crate::handler::{handler_id, Handler, HandlerResult, Reply, SharedHandler};
use crate::resolver::DeferredHandler;
use crate::server::{Request, RoutingContext};
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Per-route settings accepted by [`Router::add_route`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Static variables merged into the extracted ones; they win on collision
    pub vars: Option<HashMap<String, String>>,
    /// Accepted methods; `None` accepts any. `GET` implies `HEAD`.
    pub methods: Option<Vec<Method>>,
    /// Exclude this route from the alternate-slash redirect search
    pub no_alt_redirect: bool,
    /// Capture the rest of the path and hand it to the handler as `path_info`
    pub delegate: Option<DelegatePath>,
    /// Return the handler to the caller instead of invoking it
    pub passthrough: bool,
    /// Higher runs earlier; ties keep registration order
    pub priority: i32,
}

impl RouteOptions {
    /// Default options: any method, priority 0, no delegation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the priority
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Restrict the accepted methods
    #[must_use]
    pub fn methods<I: IntoIterator<Item = Method>>(mut self, methods: I) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Add a static variable
    #[must_use]
    pub fn var(mut self, name: &str, value: &str) -> Self {
        self.vars
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Delegate the remainder of the path
    #[must_use]
    pub fn delegate(mut self, delegate: DelegatePath) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Hand the handler back to the caller instead of invoking it
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    /// Opt out of alternate-slash redirects
    #[must_use]
    pub fn no_alt_redirect(mut self) -> Self {
        self.no_alt_redirect = true;
        self
    }
}

/// The handler bound to a route
pub(crate) enum RouteHandler {
    /// A callable supplied at registration
    Concrete(SharedHandler),
    /// An identifier resolved on first use
    Deferred(DeferredHandler),
    /// A child router built from a nested route table
    Nested(Arc<Router>),
    /// A handler returned to the caller rather than invoked
    Passthrough(Box<RouteHandler>),
}

impl RouteHandler {
    fn resolve(&self) -> SharedHandler {
        match self {
            RouteHandler::Concrete(h) => Arc::clone(h),
            RouteHandler::Deferred(d) => d.resolved(),
            RouteHandler::Nested(router) => Arc::clone(router) as SharedHandler,
            RouteHandler::Passthrough(inner) => inner.resolve(),
        }
    }

    fn view_name(&self) -> &str {
        match self {
            RouteHandler::Concrete(h) => h.name(),
            RouteHandler::Deferred(d) => d.identifier(),
            RouteHandler::Nested(router) => router.name(),
            RouteHandler::Passthrough(inner) => inner.view_name(),
        }
    }
}

/// A compiled template bound to a handler, with matching constraints.
///
/// Immutable once registered, apart from the memoized resolution of a
/// deferred handler.
pub struct Route {
    template: Option<String>,
    pattern: Regex,
    reverse: Option<ReverseTemplate>,
    variables: Vec<String>,
    delegates: bool,
    handler: RouteHandler,
    vars: Option<HashMap<String, String>>,
    methods: Option<SmallVec<[Method; 4]>>,
    no_alt_redirect: bool,
    priority: i32,
}

impl Route {
    pub(crate) fn new(
        template: Option<&str>,
        handler: RouteHandler,
        options: RouteOptions,
    ) -> Result<Self, RouteError> {
        let compiled = compile_template(template, options.delegate.as_ref())?;

        let handler = if options.passthrough {
            RouteHandler::Passthrough(Box::new(handler))
        } else {
            handler
        };

        let methods = options.methods.map(|methods| {
            let mut set: SmallVec<[Method; 4]> = SmallVec::new();
            for m in methods {
                if !set.contains(&m) {
                    set.push(m);
                }
            }
            if set.contains(&Method::GET) && !set.contains(&Method::HEAD) {
                set.push(Method::HEAD);
            }
            set
        });

        Ok(Self {
            template: template.map(str::to_string),
            pattern: compiled.pattern,
            reverse: compiled.reverse,
            variables: compiled.variables,
            delegates: compiled.delegates,
            handler,
            vars: options.vars,
            methods,
            no_alt_redirect: options.no_alt_redirect,
            priority: options.priority,
        })
    }

    /// The template this route was registered with
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// The compiled, anchored match pattern
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Reverse template, absent for routes registered without a template
    #[must_use]
    pub fn reverse_template(&self) -> Option<&ReverseTemplate> {
        self.reverse.as_ref()
    }

    /// Priority; higher runs earlier
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Accepted methods; `None` accepts any
    #[must_use]
    pub fn methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    /// Whether the route hands its handler back instead of invoking it
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self.handler, RouteHandler::Passthrough(_))
    }

    /// Name of the handler: the identifier for deferred handlers,
    /// [`Handler::name`] otherwise
    #[must_use]
    pub fn view_name(&self) -> &str {
        self.handler.view_name()
    }

    /// The handler, resolving a deferred identifier if needed
    #[must_use]
    pub fn handler(&self) -> SharedHandler {
        self.handler.resolve()
    }

    /// Identity of the resolved handler
    #[must_use]
    pub fn handler_id(&self) -> usize {
        handler_id(&self.handler.resolve())
    }

    /// Whether the route accepts `req` as it currently stands
    #[must_use]
    pub fn matches(&self, req: &Request, alternate: bool) -> bool {
        self.match_context(&req.method, &req.context, alternate)
            .is_some()
    }

    /// Match against `ctx` and build the context the handler should see.
    ///
    /// Returns `None` when the route opted out of alternate matching, the
    /// method is filtered out, or the pattern does not match `path_info`.
    #[must_use]
    pub fn match_context(
        &self,
        method: &Method,
        ctx: &RoutingContext,
        alternate: bool,
    ) -> Option<RoutingContext> {
        if alternate && self.no_alt_redirect {
            return None;
        }
        if let Some(methods) = &self.methods {
            if !methods.contains(method) {
                return None;
            }
        }
        let caps = self.pattern.captures(&ctx.path_info)?;

        let mut urlvars = HashMap::with_capacity(self.variables.len());
        for name in &self.variables {
            if let Some(m) = caps.name(name) {
                urlvars.insert(name.clone(), m.as_str().to_string());
            }
        }

        let (script_name, path_info) = if self.delegates {
            let split = caps
                .name(DELEGATE_GROUP)
                .map(|m| m.start())
                .unwrap_or(ctx.path_info.len());
            let mut script_name = ctx.script_name.clone();
            script_name.push_str(&ctx.path_info[..split]);
            (script_name, ctx.path_info[split..].to_string())
        } else {
            (ctx.script_name.clone(), ctx.path_info.clone())
        };

        if let Some(vars) = &self.vars {
            for (k, v) in vars {
                urlvars.insert(k.clone(), v.clone());
            }
        }

        Some(RoutingContext {
            script_name,
            path_info,
            urlvars,
        })
    }

    /// Match `req` and, on success, run the handler.
    ///
    /// `Ok(None)` means either no match or a handler that declined; in both
    /// cases `req` is left as it was.
    pub fn dispatch(&self, req: &mut Request) -> HandlerResult {
        match self.match_context(&req.method, &req.context, false) {
            Some(ctx) => self.invoke(req, ctx),
            None => Ok(None),
        }
    }

    /// Install `ctx` on the request and run the handler, restoring the
    /// previous context if the handler declines.
    pub(crate) fn invoke(&self, req: &mut Request, ctx: RoutingContext) -> HandlerResult {
        debug!(
            view = %self.view_name(),
            template = ?self.template,
            script_name = %ctx.script_name,
            path_info = %ctx.path_info,
            urlvars = ?ctx.urlvars,
            "Route matched"
        );

        let saved = std::mem::replace(&mut req.context, ctx);

        if let RouteHandler::Passthrough(inner) = &self.handler {
            return Ok(Some(Reply::Passthrough(inner.resolve())));
        }

        let handler = self.handler.resolve();
        match handler.call(req) {
            Ok(None) => {
                debug!(view = %self.view_name(), "Handler declined, restoring routing context");
                req.context = saved;
                Ok(None)
            }
            other => other,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("view", &self.view_name())
            .field("pattern", &self.pattern.as_str())
            .field("priority", &self.priority)
            .field("methods", &self.methods)
            .field("delegates", &self.delegates)
            .field("passthrough", &self.is_passthrough())
            .finish()
    }
}
