//! Implements the `Transport` trait with `reqwest`.

use crate::api::{build_url, Body, Request, Transport};
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::trace;
use url::Url;

/// Talks to a deployed budget service over HTTP. Cookies set by the service are kept and sent
/// back on later requests, so session-based deployments work.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::transport(format!("Unable to build the HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, base_url: &str, request: Request) -> Result<Body> {
        let url = request_url(base_url, &request)?;
        trace!("{} {url}", request.method);

        let mut builder = self.client.request(request.method, url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(format!("Unable to reach {url}: {e}")))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Unable to read the response from {url}: {e}")))?;

        if !status.is_success() {
            return Err(Error::http(status.as_u16(), text));
        }
        if !is_json {
            return Ok(Body::Text(text));
        }
        serde_json::from_str(&text)
            .map(Body::Json)
            .map_err(|e| Error::Remote {
                status: Some(status.as_u16()),
                message: format!("Invalid JSON from {url}: {e}"),
            })
    }
}

/// Joins the base URL and resource path, then appends the optional segment percent-encoded.
fn request_url(base_url: &str, request: &Request) -> Result<Url> {
    let joined = build_url(base_url, request.path);
    let mut url = Url::parse(&joined)
        .map_err(|e| Error::transport(format!("Invalid API URL '{joined}': {e}")))?;
    if let Some(segment) = &request.segment {
        url.path_segments_mut()
            .map_err(|_| Error::transport(format!("Invalid API URL '{joined}'")))?
            .push(segment);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BUDGETS_PATH, CATEGORIES_PATH, SETTINGS_PATH};
    use reqwest::Method;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// A canned response for `serve_once`.
    struct Canned {
        status: &'static str,
        content_type: Option<&'static str>,
        body: &'static str,
    }

    /// Accepts one connection, answers it with `canned` and yields the raw request text.
    async fn serve_once(canned: Canned) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let mut response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                canned.status,
                canned.body.len()
            );
            if let Some(content_type) = canned.content_type {
                response.push_str(&format!("Content-Type: {content_type}\r\n"));
            }
            response.push_str("\r\n");
            response.push_str(canned.body);
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (base, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            break;
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    #[tokio::test]
    async fn test_get_json() {
        let (base, server) = serve_once(Canned {
            status: "200 OK",
            content_type: Some("application/json; charset=utf-8"),
            body: r#"[{"name": "Food"}]"#,
        })
        .await;

        let transport = HttpTransport::new().unwrap();
        let body = transport
            .send(&base, Request::new(Method::GET, CATEGORIES_PATH))
            .await
            .unwrap();
        assert_eq!(body, Body::Json(serde_json::json!([{"name": "Food"}])));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/categories HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_trailing_slash_base() {
        let (base, server) = serve_once(Canned {
            status: "200 OK",
            content_type: Some("application/json"),
            body: "{}",
        })
        .await;
        let transport = HttpTransport::new().unwrap();
        transport
            .send(&format!("{base}/"), Request::new(Method::GET, SETTINGS_PATH))
            .await
            .unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/settings HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_text_body() {
        let (base, _server) = serve_once(Canned {
            status: "200 OK",
            content_type: Some("text/plain"),
            body: "ok",
        })
        .await;
        let transport = HttpTransport::new().unwrap();
        let body = transport
            .send(&base, Request::new(Method::GET, BUDGETS_PATH))
            .await
            .unwrap();
        assert_eq!(body, Body::Text("ok".into()));
    }

    #[tokio::test]
    async fn test_no_content() {
        let (base, server) = serve_once(Canned {
            status: "204 No Content",
            content_type: None,
            body: "",
        })
        .await;
        let transport = HttpTransport::new().unwrap();
        let body = transport
            .send(
                &base,
                Request::new(Method::DELETE, CATEGORIES_PATH).segment("Eating out/Fun"),
            )
            .await
            .unwrap();
        assert_eq!(body, Body::Text(String::new()));

        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/categories/Eating%20out%2FFun HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_error_body_is_message() {
        let (base, _server) = serve_once(Canned {
            status: "500 Internal Server Error",
            content_type: Some("text/plain"),
            body: "database is down",
        })
        .await;
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .send(&base, Request::new(Method::GET, BUDGETS_PATH))
            .await
            .unwrap_err();
        match err {
            Error::Remote { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "database is down");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body() {
        let (base, _server) = serve_once(Canned {
            status: "404 Not Found",
            content_type: None,
            body: "",
        })
        .await;
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .send(&base, Request::new(Method::GET, BUDGETS_PATH))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[tokio::test]
    async fn test_json_request_body() {
        let (base, server) = serve_once(Canned {
            status: "201 Created",
            content_type: Some("application/json"),
            body: r#"{"name": "Fun"}"#,
        })
        .await;
        let transport = HttpTransport::new().unwrap();
        transport
            .send(
                &base,
                Request::new(Method::POST, CATEGORIES_PATH)
                    .body(serde_json::json!({"name": "Fun"})),
            )
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/categories HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"name":"Fun"}"#));
    }

    #[tokio::test]
    async fn test_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new().unwrap();
        let err = transport
            .send(&base, Request::new(Method::GET, BUDGETS_PATH))
            .await
            .unwrap_err();
        match err {
            Error::Remote { status, .. } => assert_eq!(status, None),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_base_url() {
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .send("", Request::new(Method::GET, BUDGETS_PATH))
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("Invalid API URL"));
    }
}
