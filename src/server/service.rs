use super::request::Request;
use super::response::Response;
use crate::handler::{HandlerResult, Reply};
use crate::router::Router;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Body sent when dispatch produces nothing at all
pub const NO_DEFAULT_MESSAGE: &str = "Internal Server Error: no default handler configured";

/// Adapter between `http` requests and a [`Router`].
///
/// The router is shared read-only, so one service can be cloned into every
/// worker thread.
#[derive(Clone)]
pub struct RouterService {
    router: Arc<Router>,
}

impl RouterService {
    /// Wrap a router
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// The wrapped router
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Dispatch a routing [`Request`] and settle the outcome into a response.
    ///
    /// A passthrough reply is invoked here with the rewritten request. A
    /// raised terminal response that the router did not catch becomes the
    /// response. No result at all is a 500.
    pub fn respond(&self, req: &mut Request) -> Response {
        let outcome = self.router.dispatch(req);
        settle(outcome, req)
    }

    /// Handle one `http::Request`
    pub fn handle(&self, req: http::Request<String>) -> http::Response<String> {
        let mut request = Request::from_http(&req);
        let body = req.into_body();
        if !body.is_empty() {
            request.body = Some(body);
        }
        let response = self.respond(&mut request);
        into_http(response)
    }
}

fn settle(outcome: HandlerResult, req: &mut Request) -> Response {
    match outcome {
        Ok(Some(Reply::Response(response))) => response,
        Ok(Some(Reply::Passthrough(handler))) => {
            debug!(
                handler = %handler.name(),
                script_name = %req.script_name(),
                path_info = %req.path_info(),
                "Invoking passthrough handler"
            );
            match handler.call(req) {
                Ok(Some(reply)) => match reply.into_response() {
                    Some(response) => response,
                    None => {
                        warn!(handler = %handler.name(), "Passthrough handler returned a handler");
                        Response::internal_error(NO_DEFAULT_MESSAGE)
                    }
                },
                Ok(None) => Response::internal_error(NO_DEFAULT_MESSAGE),
                Err(raised) => raised.into_response(),
            }
        }
        Ok(None) => {
            error!(
                method = %req.method,
                path_info = %req.path_info(),
                "No route answered and no default handler configured"
            );
            Response::internal_error(NO_DEFAULT_MESSAGE)
        }
        Err(raised) => {
            debug!(status = %raised.0.status, "Uncaught raised response");
            raised.into_response()
        }
    }
}

fn into_http(response: Response) -> http::Response<String> {
    let (body, content_type) = response.render_body();
    let mut out = http::Response::new(body);
    *out.status_mut() = response.status;

    let headers = out.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    for (name, value) in &response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) if name == CONTENT_TYPE => {
                headers.insert(name, value);
            }
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(header = %name, "Dropping header that is not valid HTTP"),
        }
    }
    out
}
