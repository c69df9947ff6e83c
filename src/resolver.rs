//! Handler resolution by string identifier.
//!
//! Routes may name their handler as `"<namespace>:<name>"` instead of
//! holding it directly. The identifier is resolved on first use through a
//! [`ResolveHandler`], normally a [`HandlerRegistry`] populated at startup.
//!
//! Resolution never fails: an unknown namespace or name yields a handler
//! that answers every request with a 500 carrying a diagnostic message, so
//! a typo in a route table surfaces at request time rather than crashing
//! registration.

use crate::handler::{HandlerResult, Reply, SharedHandler};
use crate::server::{Request, Response};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a handler identifier into a callable
pub trait ResolveHandler: Send + Sync {
    /// Resolve `identifier`. Must be deterministic for a given identifier.
    fn resolve(&self, identifier: &str) -> SharedHandler;
}

/// Handler that always answers with a diagnostic 500
pub struct InternalErrorHandler {
    message: String,
}

impl InternalErrorHandler {
    /// Build a diagnostic handler for `message`
    #[must_use]
    pub fn new(message: String) -> Self {
        Self { message }
    }

    /// The diagnostic this handler reports
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl crate::handler::Handler for InternalErrorHandler {
    fn call(&self, _req: &mut Request) -> HandlerResult {
        Ok(Some(Reply::Response(Response::internal_error(&self.message))))
    }

    fn name(&self) -> &str {
        "internal_error"
    }
}

/// Shared diagnostic handler for `message`
#[must_use]
pub fn internal_error_handler(message: String) -> SharedHandler {
    Arc::new(InternalErrorHandler::new(message))
}

/// Namespaced registry of handlers, keyed `namespace -> name -> handler`.
///
/// Safe to populate and read concurrently; in practice it is filled once at
/// startup and only read afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    namespaces: DashMap<String, HashMap<String, SharedHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `"<namespace>:<name>"`.
    ///
    /// Replaces any handler previously registered under the same identifier.
    pub fn register(&self, namespace: &str, name: &str, handler: SharedHandler) {
        let replaced = self
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), handler)
            .is_some();
        if replaced {
            warn!(namespace = %namespace, name = %name, "Replaced existing handler registration");
        } else {
            debug!(namespace = %namespace, name = %name, "Handler registered");
        }
    }

    /// Register a handler by its full identifier (`"namespace:name"`)
    ///
    /// Identifiers without a `:` are registered under the empty namespace.
    pub fn register_id(&self, identifier: &str, handler: SharedHandler) {
        let (namespace, name) = identifier.split_once(':').unwrap_or(("", identifier));
        self.register(namespace, name, handler);
    }

    /// Whether a namespace has been registered
    #[must_use]
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Number of registered handlers across all namespaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.value().len()).sum()
    }

    /// Whether nothing has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResolveHandler for HandlerRegistry {
    fn resolve(&self, identifier: &str) -> SharedHandler {
        let Some((namespace, name)) = identifier.split_once(':') else {
            warn!(identifier = %identifier, "Handler identifier has no namespace");
            return internal_error_handler(format!(
                "Handler identifier {identifier} is not of the form namespace:name."
            ));
        };

        let Some(ns) = self.namespaces.get(namespace) else {
            warn!(namespace = %namespace, identifier = %identifier, "Handler namespace not found");
            return internal_error_handler(format!("Namespace {namespace} does not exist."));
        };

        match ns.get(name) {
            Some(handler) => Arc::clone(handler),
            None => {
                warn!(namespace = %namespace, name = %name, "Handler not found in namespace");
                internal_error_handler(format!(
                    "Handler {name} not found in namespace {namespace}"
                ))
            }
        }
    }
}

/// A handler known only by identifier until first use.
///
/// The first call (or [`DeferredHandler::resolved`]) asks the resolver and
/// memoizes the answer; later calls reuse it. Concurrent first calls block
/// on a single initializer, so every caller observes the same handler.
pub struct DeferredHandler {
    identifier: String,
    resolver: Arc<dyn ResolveHandler>,
    cell: OnceCell<SharedHandler>,
}

impl DeferredHandler {
    /// Defer resolution of `identifier` through `resolver`
    #[must_use]
    pub fn new(identifier: &str, resolver: Arc<dyn ResolveHandler>) -> Self {
        Self {
            identifier: identifier.to_string(),
            resolver,
            cell: OnceCell::new(),
        }
    }

    /// The identifier this handler stands for
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether resolution has already happened
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Resolve (once) and return the underlying handler
    #[must_use]
    pub fn resolved(&self) -> SharedHandler {
        Arc::clone(self.cell.get_or_init(|| {
            debug!(identifier = %self.identifier, "Resolving deferred handler");
            self.resolver.resolve(&self.identifier)
        }))
    }
}

impl crate::handler::Handler for DeferredHandler {
    fn call(&self, req: &mut Request) -> HandlerResult {
        self.resolved().call(req)
    }

    fn name(&self) -> &str {
        &self.identifier
    }
}

/// Resolver used when nothing was configured: every identifier is unknown
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl ResolveHandler for NullResolver {
    fn resolve(&self, identifier: &str) -> SharedHandler {
        warn!(identifier = %identifier, "No handler resolver configured");
        internal_error_handler(format!(
            "No resolver configured to look up handler {identifier}."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_id, named, Handler};
    use http::StatusCode;

    fn call(handler: &SharedHandler) -> Response {
        let mut req = Request::blank("/");
        handler
            .call(&mut req)
            .unwrap()
            .and_then(Reply::into_response)
            .unwrap()
    }

    #[test]
    fn test_resolves_registered_handler() {
        let registry = HandlerRegistry::new();
        let view = named("view", |_req: &mut Request| Ok(Some(Response::text("ok").into())));
        registry.register("pets", "list", Arc::clone(&view));
        let resolved = registry.resolve("pets:list");
        assert_eq!(handler_id(&resolved), handler_id(&view));
        assert_eq!(registry.len(), 1);
        assert!(registry.has_namespace("pets"));
        assert!(!registry.has_namespace("cats"));
    }

    #[test]
    fn test_internal_error_handler_reports_message() {
        let handler = InternalErrorHandler::new("Namespace x does not exist.".to_string());
        assert_eq!(handler.message(), "Namespace x does not exist.");
        assert_eq!(handler.name(), "internal_error");
        let mut req = Request::blank("/");
        let resp = handler
            .call(&mut req)
            .unwrap()
            .and_then(Reply::into_response)
            .unwrap();
        assert_eq!(resp.body["error"], "Namespace x does not exist.");
    }

    #[test]
    fn test_missing_namespace_yields_diagnostic() {
        let registry = HandlerRegistry::new();
        let resp = call(&registry.resolve("nonexistent.invalid:view"));
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.body["error"]
            .as_str()
            .unwrap()
            .contains("nonexistent.invalid"));
    }

    #[test]
    fn test_missing_name_yields_diagnostic() {
        let registry = HandlerRegistry::new();
        registry.register_id("app:real", named("real", |_req: &mut Request| Ok(None)));
        let resp = call(&registry.resolve("app:xxx_nonexistent_view"));
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.body["error"]
            .as_str()
            .unwrap()
            .contains("xxx_nonexistent_view"));
    }

    #[test]
    fn test_deferred_handler_resolves_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingResolver {
            hits: AtomicUsize,
            handler: SharedHandler,
        }
        impl ResolveHandler for CountingResolver {
            fn resolve(&self, _identifier: &str) -> SharedHandler {
                self.hits.fetch_add(1, Ordering::SeqCst);
                Arc::clone(&self.handler)
            }
        }

        let resolver = Arc::new(CountingResolver {
            hits: AtomicUsize::new(0),
            handler: named("hit", |_req: &mut Request| Ok(Some(Response::text("hit").into()))),
        });
        let deferred = DeferredHandler::new("app:hit", Arc::clone(&resolver) as Arc<dyn ResolveHandler>);
        assert!(!deferred.is_resolved());
        assert_eq!(deferred.name(), "app:hit");

        let first = deferred.resolved();
        let second = deferred.resolved();
        assert_eq!(handler_id(&first), handler_id(&second));
        assert_eq!(resolver.hits.load(Ordering::SeqCst), 1);
        assert_eq!(call(&first).body, "hit");
    }

    #[test]
    fn test_identifier_without_namespace() {
        let resp = call(&HandlerRegistry::new().resolve("plain"));
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
