//! # Handler Module
//!
//! Handlers are the leaves of the routing tree: anything that can turn a
//! [`Request`](crate::server::Request) into a reply. The router itself is
//! a handler, which is what makes nesting work.
//!
//! ## Outcomes
//!
//! A handler returns a [`HandlerResult`]:
//!
//! - `Ok(Some(Reply::Response(..)))` - a final response
//! - `Ok(Some(Reply::Passthrough(..)))` - a raw handler the caller must
//!   invoke itself with the (already rewritten) request
//! - `Ok(None)` - "not mine after all"; the router restores the routing
//!   context and tries the next candidate route
//! - `Err(TerminalResponse)` - a response raised to short-circuit normal
//!   return flow; the router's `catch_raised_responses` option decides
//!   whether it becomes the dispatch result or propagates further
//!
//! ## Example
//!
//! ```rust
//! use routeshift::handler::{named, Handler, Reply};
//! use routeshift::server::{Request, Response};
//!
//! let hello = named("hello", |_req: &mut Request| {
//!     Ok(Some(Reply::Response(Response::text("hello!"))))
//! });
//! assert_eq!(hello.name(), "hello");
//! ```

mod core;

pub use core::{
    handler_id, named, Handler, HandlerResult, NamedHandler, Reply, SharedHandler,
    TerminalResponse,
};
