use super::response::HeaderVec;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Path state threaded through nested routing.
///
/// `script_name` is the prefix consumed by enclosing mounts, `path_info`
/// is what is left for the current router to match, and `urlvars` holds
/// the variables extracted by the most recent matching route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingContext {
    /// Path prefix already matched by enclosing routes
    pub script_name: String,
    /// Remaining path to be matched
    pub path_info: String,
    /// Variables extracted by the matching route, merged with its static vars
    pub urlvars: HashMap<String, String>,
}

impl RoutingContext {
    /// Context for a top-level request: nothing consumed yet
    #[must_use]
    pub fn new(path_info: impl Into<String>) -> Self {
        Self {
            script_name: String::new(),
            path_info: path_info.into(),
            urlvars: HashMap::new(),
        }
    }

    /// Same context with the trailing slash of `path_info` toggled
    #[must_use]
    pub fn with_toggled_slash(&self) -> Self {
        let mut ctx = self.clone();
        if ctx.path_info.ends_with('/') {
            ctx.path_info.pop();
        } else {
            ctx.path_info.push('/');
        }
        ctx
    }

    /// Full path: consumed prefix plus the remainder
    #[must_use]
    pub fn full_path(&self) -> String {
        let mut path = String::with_capacity(self.script_name.len() + self.path_info.len());
        path.push_str(&self.script_name);
        path.push_str(&self.path_info);
        path
    }
}

/// The request as seen by the routing core.
///
/// Built once per inbound request by the boundary adapter (or by
/// [`Request::blank`] in tests). Routes rewrite [`Request::context`] as
/// they delegate; everything else is read-only for the router.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Scheme and authority used to build absolute URLs, e.g. `http://localhost`
    pub host_url: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body, if any
    pub body: Option<String>,
    /// Routing state rewritten by delegating routes
    pub context: RoutingContext,
    decode_error: Option<String>,
}

impl Request {
    /// Build a request for `target` (path plus optional `?query`).
    ///
    /// The path is percent-decoded; if decoding fails the raw path is kept
    /// and the request is flagged malformed, which the router reports as a
    /// bad request.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (raw_path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (target, None),
        };
        let (path_info, decode_error) = match urlencoding::decode(raw_path) {
            Ok(decoded) => (decoded.into_owned(), None),
            Err(e) => (raw_path.to_string(), Some(e.to_string())),
        };
        Self {
            method,
            host_url: "http://localhost".to_string(),
            query,
            headers: HeaderVec::new(),
            body: None,
            context: RoutingContext::new(path_info),
            decode_error,
        }
    }

    /// A GET request for `target` on `http://localhost`
    #[must_use]
    pub fn blank(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Same request with a different method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Build a request from an `http::Request`, taking the host from the
    /// `Host` header when present.
    #[must_use]
    pub fn from_http<B>(req: &http::Request<B>) -> Self {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let mut request = Self::new(req.method().clone(), target);

        for (name, value) in req.headers() {
            if let Ok(v) = value.to_str() {
                request.headers.push((Arc::from(name.as_str()), v.to_string()));
            }
        }

        let scheme = req.uri().scheme_str().unwrap_or("http");
        if let Some(host) = request
            .get_header("host")
            .map(str::to_string)
            .or_else(|| req.uri().authority().map(|a| a.to_string()))
        {
            request.host_url = format!("{scheme}://{host}");
        }
        request
    }

    /// Why the path could not be decoded, if it could not
    #[must_use]
    pub fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }

    /// Remaining path to be matched
    #[inline]
    #[must_use]
    pub fn path_info(&self) -> &str {
        &self.context.path_info
    }

    /// Prefix consumed by enclosing routes
    #[inline]
    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.context.script_name
    }

    /// Variables extracted by the matching route
    #[inline]
    #[must_use]
    pub fn urlvars(&self) -> &HashMap<String, String> {
        &self.context.urlvars
    }

    /// A single extracted variable
    #[inline]
    #[must_use]
    pub fn urlvar(&self, name: &str) -> Option<&str> {
        self.context.urlvars.get(name).map(String::as_str)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parsed query string parameters
    #[must_use]
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Absolute URL of this request under its current routing context
    #[must_use]
    pub fn url(&self) -> String {
        self.url_for(&self.context)
    }

    /// Absolute URL this request would have under `ctx`
    #[must_use]
    pub fn url_for(&self, ctx: &RoutingContext) -> String {
        let path = ctx.full_path();
        let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
        let mut url = format!("{}{}", self.host_url.trim_end_matches('/'), encoded.join("/"));
        if let Some(q) = &self.query {
            url.push('?');
            url.push_str(q);
        }
        url
    }
}
