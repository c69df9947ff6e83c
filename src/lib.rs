//! # routeshift
//!
//! **routeshift** is a priority-ordered request router built on path
//! templates. Routes can delegate part of the path to nested routers, name
//! their handlers lazily by identifier, and be reversed back into URLs.
//!
//! ## Overview
//!
//! A [`Router`] holds routes in dispatch order. Each route couples a
//! compiled path template (`/pets/{id:\d+}`) with a handler and a few
//! constraints: accepted methods, static variables, a priority. Dispatching
//! a request tries matching routes in order until a handler answers; a
//! handler may decline by returning `Ok(None)`, in which case the next
//! matching route gets its turn.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`router`]** - Template compilation, route ordering, dispatch and reversal
//! - **[`handler`]** - The [`Handler`] trait and its result types
//! - **[`resolver`]** - Lazy handler resolution by `namespace:name` identifier
//! - **[`server`]** - Request/response types and the `http` adapter
//! - **[`config`]** - YAML/JSON route-table files
//! - **[`runtime_config`]** - Environment-driven router defaults
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`echo`]** - Echo handlers for exercising route tables
//! - **[`cli`]** - The `routeshift` command-line tool
//!
//! ### Dispatch Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Adapter as RouterService
//!     participant Router
//!     participant Route
//!     participant Handler
//!
//!     Adapter->>Router: dispatch(&mut Request)
//!     loop routes in priority order
//!         Router->>Route: match_context(method, context)
//!         Route-->>Router: rewritten RoutingContext
//!         Router->>Handler: call(&mut Request)
//!         alt answered
//!             Handler-->>Router: Ok(Some(reply))
//!         else declined
//!             Handler-->>Router: Ok(None), context restored
//!         end
//!     end
//!     Router->>Router: slash-toggled redirect or default handler
//!     Router-->>Adapter: HandlerResult
//! ```
//!
//! ### Path Shifting
//!
//! A route registered with a delegate pattern matches only a prefix of the
//! path. The matched prefix moves from `path_info` to `script_name` before
//! the handler runs, so a nested router sees paths relative to its mount
//! point:
//!
//! | Mount    | Request path    | `script_name` | `path_info` |
//! |----------|-----------------|---------------|-------------|
//! | `/admin` | `/admin/users`  | `/admin`      | `/users`    |
//! | `/admin` | `/admin/`       | `/admin`      | `/`         |
//!
//! ## Quick Start
//!
//! ```rust
//! use routeshift::handler::{named, Reply};
//! use routeshift::router::{DelegatePath, RouteOptions, RouteTable, Router};
//! use routeshift::server::{Request, Response};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let users = named("users", |req: &mut Request| {
//!     let body = format!("{} {}", req.script_name(), req.path_info());
//!     Ok(Some(Reply::Response(Response::text(body))))
//! });
//!
//! let mut router = Router::new();
//! router.add_route(
//!     Some("/admin"),
//!     RouteTable::new().route("/users", users),
//!     RouteOptions::new().delegate(DelegatePath::Anything),
//! )?;
//!
//! let mut req = Request::blank("/admin/users");
//! let resp = router.dispatch(&mut req)?.and_then(Reply::into_response);
//! assert_eq!(resp.map(|r| r.body), Some("/admin /users".into()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Router defaults come from the environment (see [`runtime_config`]):
//!
//! ```bash
//! export ROUTESHIFT_TRY_SLASHES=1
//! export ROUTESHIFT_CATCH_RAISED_RESPONSES=1
//! export ROUTESHIFT_LOG_LEVEL=debug
//! export ROUTESHIFT_LOG_FORMAT=json
//! ```
//!
//! Whole route tables can be loaded from files with [`config::load_router`].

pub mod cli;
pub mod config;
pub mod echo;
pub mod handler;
pub mod logging;
pub mod resolver;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use handler::{named, Handler, HandlerResult, Reply, SharedHandler, TerminalResponse};
pub use resolver::{DeferredHandler, HandlerRegistry, ResolveHandler};
pub use router::{
    DelegatePath, ReverseError, Route, RouteError, RouteOptions, RouteTable, Router,
    RouterOptions, Target, TemplateError,
};
pub use server::{Request, Response, RouterService, RoutingContext};
