//! # Router Module
//!
//! Template-based request routing with priorities, nested mounts and URL
//! reversal.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling path templates (`/users/{id:\d+}`) into anchored regexes
//! - Keeping routes ordered by priority
//! - Dispatching a request to the first route whose handler answers
//! - Shifting matched path prefixes into `script_name` for nested routers
//! - Redirecting to the trailing-slash-toggled path when only that matches
//! - Building URLs back from route templates
//!
//! ## Architecture
//!
//! 1. **Compilation**: at registration, templates are compiled into regex
//!    patterns plus reverse templates. Malformed templates are rejected here.
//!
//! 2. **Dispatch**: for each request, routes are tried in priority order.
//!    A route whose handler returns `Ok(None)` is skipped and its changes to
//!    the routing context are undone.
//!
//! ## Example
//!
//! ```rust
//! use routeshift::handler::{named, Reply};
//! use routeshift::router::Router;
//! use routeshift::server::{Request, Response};
//! use std::collections::HashMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! let route = router.route(
//!     "/pets/{id:\\d+}",
//!     named("get_pet", |req: &mut Request| {
//!         let id = req.urlvar("id").unwrap_or_default().to_string();
//!         Ok(Some(Reply::Response(Response::text(id))))
//!     }),
//! )?;
//!
//! let mut req = Request::blank("/pets/42");
//! let reply = router.dispatch(&mut req)?.and_then(Reply::into_response);
//! assert_eq!(reply.map(|r| r.body), Some("42".into()));
//!
//! let vars = HashMap::from([("id".to_string(), "7".to_string())]);
//! assert_eq!(router.reverse(&route, &vars, None)?, "/pets/7");
//! # Ok(())
//! # }
//! ```

mod core;
mod error;
mod route;
mod table;
pub mod template;
#[cfg(test)]
mod tests;

pub use core::{not_found_handler, RouteLookup, Router, RouterOptions};
pub use error::{ReverseError, RouteError, TemplateError};
pub use route::{Route, RouteOptions};
pub use table::{RouteEntry, RouteTable, Target};
pub use template::{compile_template, CompiledTemplate, DelegatePath, ReverseTemplate};
