//! # Server Module
//!
//! Request and response types seen by handlers, plus [`RouterService`], the
//! adapter that turns an `http::Request` into a dispatch and the outcome
//! back into an `http::Response`.
//!
//! ## Routing Context
//!
//! Each [`Request`] carries a [`RoutingContext`]: the consumed prefix
//! (`script_name`), the remaining path (`path_info`) and the variables
//! captured so far (`urlvars`). Routes rewrite the context before invoking
//! their handler and restore it when the handler declines.

pub mod request;
pub mod response;
pub mod service;

pub use request::{Request, RoutingContext};
pub use response::{HeaderVec, Response, MAX_INLINE_HEADERS};
pub use service::{RouterService, NO_DEFAULT_MESSAGE};
