//! Echo handlers for trying out route tables.
//!
//! [`EchoResolver`] resolves every identifier to a handler that answers with
//! a JSON description of how the request was routed. The CLI uses it so a
//! route table can be exercised without real handlers.

use crate::handler::{named, Reply, SharedHandler};
use crate::resolver::ResolveHandler;
use crate::server::{Request, Response};
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;

/// Resolver whose handlers echo their routing state back
#[derive(Default)]
pub struct EchoResolver {
    handlers: DashMap<String, SharedHandler>,
}

impl EchoResolver {
    /// Create an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResolveHandler for EchoResolver {
    fn resolve(&self, identifier: &str) -> SharedHandler {
        let entry = self
            .handlers
            .entry(identifier.to_string())
            .or_insert_with(|| echo_handler(identifier));
        Arc::clone(entry.value())
    }
}

/// Handler that echoes the routing state of each request it receives
#[must_use]
pub fn echo_handler(identifier: &str) -> SharedHandler {
    let handler_name = identifier.to_string();
    named(identifier, move |req: &mut Request| {
        let body = json!({
            "handler": handler_name,
            "method": req.method.as_str(),
            "script_name": req.script_name(),
            "path_info": req.path_info(),
            "urlvars": req.urlvars(),
            "query": req.query_params(),
        });
        Ok(Some(Reply::Response(Response::ok(body))))
    })
}
