//! Access to the remote budget service.
//!
//! `Transport` is the low-level seam: it sends one request and hands back the decoded body. It has
//! two implementations, `HttpTransport` for a real deployment and `TestRemote`, which keeps the
//! remote's data in memory. `SyncGateway` sits on top and offers the typed operations the app
//! uses.

mod gateway;
mod http;
mod test_remote;

pub use gateway::SyncGateway;
pub use http::HttpTransport;
pub use test_remote::{TestRemote, TestRemoteState};

use crate::Result;
use reqwest::Method;
use serde_json::Value;

pub(crate) const BUDGETS_PATH: &str = "/api/budgets";
pub(crate) const CATEGORIES_PATH: &str = "/api/categories";
pub(crate) const SETTINGS_PATH: &str = "/api/settings";

/// The environment variable that switches the remote to the in-memory `TestRemote`.
pub const TEST_MODE_VAR: &str = "BUDGETTRACKR_IN_TEST_MODE";

/// One call against the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// One of the fixed resource paths.
    pub path: &'static str,
    /// An optional trailing path segment such as a budget id or category name. It is encoded as a
    /// single segment, so it may contain `/` or spaces.
    pub segment: Option<String>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            segment: None,
            body: None,
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The response declared a JSON content type.
    Json(Value),
    /// Anything else, including an empty body.
    Text(String),
}

impl Body {
    /// The JSON value, if the body was JSON.
    pub fn json(self) -> Option<Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }
}

/// Sends a single request to the remote service. Each call is one attempt; implementations do
/// not retry.
///
/// A non-success response fails with `Error::Remote` carrying the status and the body text (or
/// `HTTP {status}` when the body is empty).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, base_url: &str, request: Request) -> Result<Body>;
}

/// Which `Transport` the application talks to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Use HTTP against the configured base URL.
    #[default]
    Http,
    /// Use an in-memory remote, so the whole app can run without a server.
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `BUDGETTRACKR_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Http,
        }
    }
}

/// Constructs the `Transport` for `mode`.
pub fn transport(mode: Mode) -> Result<Box<dyn Transport>> {
    match mode {
        Mode::Http => Ok(Box::new(HttpTransport::new()?)),
        Mode::Testing => Ok(Box::new(TestRemote::default())),
    }
}

/// Joins `base` and `path` with exactly one `/` between them. An empty `base` yields `path`
/// unchanged.
///
/// ```
/// use budgettrackr_sync::api::build_url;
/// assert_eq!(build_url("http://x/", "/api/a"), "http://x/api/a");
/// assert_eq!(build_url("http://x", "api/a"), "http://x/api/a");
/// assert_eq!(build_url("", "/api/a"), "/api/a");
/// ```
pub fn build_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    match (base.ends_with('/'), path.strip_prefix('/')) {
        (true, Some(rest)) => format!("{base}{rest}"),
        (false, None) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        assert_eq!(build_url("http://x/", "/api/a"), "http://x/api/a");
        assert_eq!(build_url("http://x", "api/a"), "http://x/api/a");
        assert_eq!(build_url("http://x", "/api/a"), "http://x/api/a");
        assert_eq!(build_url("http://x/", "api/a"), "http://x/api/a");
        assert_eq!(build_url("", "/api/a"), "/api/a");
        assert_eq!(
            build_url("http://localhost:4000", BUDGETS_PATH),
            "http://localhost:4000/api/budgets"
        );
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new(Method::PUT, BUDGETS_PATH)
            .segment("abc")
            .body(serde_json::json!({"name": "x"}));
        assert_eq!(request.segment.as_deref(), Some("abc"));
        assert_eq!(request.body.unwrap()["name"], "x");
    }

    #[test]
    fn test_body_json() {
        assert_eq!(
            Body::Json(serde_json::json!([1])).json(),
            Some(serde_json::json!([1]))
        );
        assert_eq!(Body::Text("ok".into()).json(), None);
    }
}
