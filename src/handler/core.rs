use crate::server::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// What a handler produced when it chose to answer
pub enum Reply {
    /// A final response
    Response(Response),
    /// A raw handler mounted below this point; the caller invokes it with
    /// the rewritten request
    Passthrough(SharedHandler),
}

impl Reply {
    /// The response, if this reply is one
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Reply::Response(resp) => Some(resp),
            Reply::Passthrough(_) => None,
        }
    }
}

impl From<Response> for Reply {
    fn from(resp: Response) -> Self {
        Reply::Response(resp)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Response(resp) => f.debug_tuple("Response").field(resp).finish(),
            Reply::Passthrough(h) => f.debug_tuple("Passthrough").field(&h.name()).finish(),
        }
    }
}

/// A complete response raised by a handler instead of returned.
///
/// Carried in the `Err` arm of [`HandlerResult`] so handlers can bail out
/// with `?` from deep inside their logic.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalResponse(pub Response);

impl TerminalResponse {
    /// Unwrap the carried response
    #[must_use]
    pub fn into_response(self) -> Response {
        self.0
    }
}

impl From<Response> for TerminalResponse {
    fn from(resp: Response) -> Self {
        TerminalResponse(resp)
    }
}

impl fmt::Display for TerminalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminal response raised with status {}", self.0.status)
    }
}

impl std::error::Error for TerminalResponse {}

/// Result of invoking a handler; `Ok(None)` means "not handled"
pub type HandlerResult = Result<Option<Reply>, TerminalResponse>;

/// Anything that can answer a request.
///
/// Implemented for plain closures `Fn(&mut Request) -> HandlerResult`, for
/// [`NamedHandler`], and for [`Router`](crate::router::Router).
pub trait Handler: Send + Sync {
    /// Handle the request
    fn call(&self, req: &mut Request) -> HandlerResult;

    /// Name used for reverse lookups and logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.name())
    }
}

/// Handlers are shared between routes, routers and the resolver cache
pub type SharedHandler = Arc<dyn Handler>;

impl<F> Handler for F
where
    F: Fn(&mut Request) -> HandlerResult + Send + Sync,
{
    fn call(&self, req: &mut Request) -> HandlerResult {
        self(req)
    }
}

/// A handler with an explicit name, so it can be reversed by name
pub struct NamedHandler<F> {
    name: String,
    func: F,
}

impl<F> Handler for NamedHandler<F>
where
    F: Fn(&mut Request) -> HandlerResult + Send + Sync,
{
    fn call(&self, req: &mut Request) -> HandlerResult {
        (self.func)(req)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a named, shareable handler
pub fn named<F>(name: &str, func: F) -> SharedHandler
where
    F: Fn(&mut Request) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(NamedHandler {
        name: name.to_string(),
        func,
    })
}

/// Identity of a handler: the address of the shared allocation.
///
/// Two routes mounting the same `Arc` share an identity; two separately
/// built handlers never do.
#[inline]
#[must_use]
pub fn handler_id(handler: &SharedHandler) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}
