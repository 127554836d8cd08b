//! Transport boundary for all HTTP I/O.
//!
//! Tracker clients build [`HttpRequest`] values and read [`HttpResponse`]
//! values. Only [`reqwest_transport`] touches the network; tests swap in
//! [`MockTransport`].

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// The methods the tracker APIs need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST and DELETE change remote state. A read-only
    /// [`ApiClient`](crate::client::ApiClient) refuses them.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        self != HttpMethod::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header pairs. Lookups ignore case.
pub type HttpHeaders = Vec<(String, String)>;

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// First value of header `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First value of header `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// Body decoded lossily, for error messages.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: String, url: String },
}

/// Sends one request and returns the raw response, whatever its status.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

pub mod reqwest_transport {
    use std::time::Duration;

    use super::{HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
    use async_trait::async_trait;

    /// Network transport backed by a shared `reqwest::Client`.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        /// Build a client whose requests give up after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
            reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map(Self::new)
                .map_err(|e| HttpError::Transport(e.to_string()))
        }
    }

    impl From<HttpMethod> for reqwest::Method {
        fn from(method: HttpMethod) -> Self {
            match method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Delete => reqwest::Method::DELETE,
            }
        }
    }

    impl From<reqwest::Error> for HttpError {
        fn from(e: reqwest::Error) -> Self {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Transport(e.to_string())
            }
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let builder = headers.iter().fold(
                self.client.request(method.into(), url.as_str()),
                |b, (k, v)| b.header(k.as_str(), v.as_str()),
            );
            let builder = if body.is_empty() {
                builder
            } else {
                builder.body(body)
            };

            let resp = builder.send().await?;
            let status = resp.status().as_u16();
            // Non-UTF-8 header values are dropped to empty strings
            let headers: HttpHeaders = resp
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect();
            let body = resp.bytes().await?.to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
pub(crate) use mock::MockTransport;


#[cfg(test)]
mod tests {
    use super::reqwest_transport::ReqwestTransport;
    use super::*;
    use std::time::Duration;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_header_lookup_ignores_case_and_takes_first() {
        let response = HttpResponse {
            status: 200,
            headers: vec![
                ("Link".to_string(), "<a>; rel=\"next\"".to_string()),
                ("link".to_string(), "<b>; rel=\"last\"".to_string()),
            ],
            body: Vec::new(),
        };
        assert_eq!(response.header("LINK"), Some("<a>; rel=\"next\""));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_only_get_is_read_only() {
        assert!(!HttpMethod::Get.is_mutating());
        assert!(HttpMethod::Post.is_mutating());
        assert!(HttpMethod::Delete.is_mutating());
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_success_range() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: b"gone".to_vec(),
        };
        assert!(response.is_success());
        assert_eq!(response.body_text(), "gone");

        response.status = 301;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_mock_answers_in_queue_order_and_records_requests() {
        let transport = MockTransport::new();
        let url = "https://tracker.test/api/v1/userstories";
        transport.push_json(HttpMethod::Get, url, 200, vec![], serde_json::json!([1]));
        transport.push_json(HttpMethod::Get, url, 200, vec![], serde_json::json!([2]));

        let first = transport.send(get(url)).await.expect("first");
        let second = transport.send(get(url)).await.expect("second");

        assert_eq!(first.body, b"[1]");
        assert_eq!(second.body, b"[2]");
        assert_eq!(transport.requests(), vec![get(url), get(url)]);
        assert_eq!(transport.count(HttpMethod::Delete), 0);
    }

    #[tokio::test]
    async fn test_mock_without_route_names_the_request() {
        let transport = MockTransport::new();
        let mut request = get("https://tracker.test/userstories/9");
        request.method = HttpMethod::Delete;

        let err = transport.send(request).await.expect_err("no route");

        assert_eq!(
            err.to_string(),
            "no mock response registered for DELETE https://tracker.test/userstories/9"
        );
        assert_eq!(transport.count(HttpMethod::Delete), 1);
    }

    #[test]
    fn test_reqwest_transport_builds_with_timeout() {
        assert!(ReqwestTransport::with_timeout(Duration::from_secs(1)).is_ok());
    }

    /// One request against a loopback socket, answered with a canned 204.
    #[tokio::test]
    async fn test_reqwest_transport_round_trip_over_loopback() {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

            let mut head = Vec::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                head.push(line.to_lowercase());
            }

            let mut stream = stream;
            stream
                .write_all(b"HTTP/1.1 204 No Content\r\nX-Trace: 7\r\nConnection: close\r\n\r\n")
                .expect("write");
            head
        });

        let transport = ReqwestTransport::new(reqwest::Client::new());
        let request = HttpRequest {
            method: HttpMethod::Delete,
            url: format!("http://{addr}/userstories/3"),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: Vec::new(),
        };

        let response = transport.send(request).await.expect("send");
        assert_eq!(response.status, 204);
        assert_eq!(response.header("x-trace"), Some("7"));

        let head = server.join().expect("server thread");
        assert!(head[0].starts_with("delete /userstories/3 "));
        assert!(head.iter().any(|l| l.starts_with("authorization: bearer t")));
    }

    #[tokio::test]
    async fn test_reqwest_transport_rejects_invalid_url() {
        let transport = ReqwestTransport::new(reqwest::Client::new());
        let err = transport.send(get("not a url")).await.expect_err("invalid");
        assert!(matches!(err, HttpError::Transport(_)));
    }
}
