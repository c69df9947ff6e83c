use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage shared by requests and responses.
///
/// Header names use `Arc<str>` so repeated names clone in O(1).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A complete response produced by a handler.
///
/// The body is a JSON value: string bodies are written raw as text by the
/// boundary adapter, everything else is serialized as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status code
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    /// Response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl Response {
    /// Create a response with the given status and body and no headers
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body,
        }
    }

    /// 200 OK with the given body
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// 200 OK with a plain text body
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok(Value::String(body.into()))
    }

    /// JSON response with a `content-type` header
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        let mut resp = Self::new(status, body);
        resp.set_header("content-type", "application/json".to_string());
        resp
    }

    /// Error response carrying a diagnostic message
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// 404 Not Found
    #[must_use]
    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, "Not Found")
    }

    /// 400 Bad Request
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    /// 500 Internal Server Error
    #[must_use]
    pub fn internal_error(message: &str) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 307 Temporary Redirect to `location`
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        let mut resp = Self::new(StatusCode::TEMPORARY_REDIRECT, Value::Null);
        resp.set_header("location", location.to_string());
        resp
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `location` header, if this is a redirect
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.get_header("location")
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Render the body as bytes plus the content type the adapter should send
    #[must_use]
    pub fn render_body(&self) -> (String, &'static str) {
        match &self.body {
            Value::Null => (String::new(), "text/plain; charset=utf-8"),
            Value::String(s) => (s.clone(), "text/plain; charset=utf-8"),
            other => (other.to_string(), "application/json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_sets_location() {
        let resp = Response::redirect("http://localhost/path/");
        assert_eq!(resp.status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.location(), Some("http://localhost/path/"));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut resp = Response::text("hi");
        resp.set_header("X-Thing", "a".to_string());
        resp.set_header("x-thing", "b".to_string());
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.get_header("X-THING"), Some("b"));
    }

    #[test]
    fn test_render_body() {
        assert_eq!(Response::text("hello").render_body().0, "hello");
        let (body, ct) = Response::error(StatusCode::NOT_FOUND, "Not Found").render_body();
        assert_eq!(ct, "application/json");
        assert_eq!(body, r#"{"error":"Not Found"}"#);
    }
}
