//! Authenticated HTTP client shared by every tracker integration.
//!
//! [`ApiClient`] owns the three things every call needs: the base URL, the
//! authorization header and the per-request timeout. Non-2xx responses are
//! mapped to [`ApiError`] in one place, so tracker clients only deal with
//! typed bodies.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::rate_limit::ApiRateLimiter;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("storysync/", env!("CARGO_PKG_VERSION"));

/// How requests are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
}

impl Authorization {
    fn header_value(&self) -> String {
        match self {
            Authorization::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authorization::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Authenticated HTTP client.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    authorization: Option<Authorization>,
    default_headers: HttpHeaders,
    timeout: Duration,
    rate_limiter: Option<ApiRateLimiter>,
    read_only: bool,
}

impl ApiClient {
    /// Create a client backed by reqwest.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Ok(Self::new_with_transport(base_url, Arc::new(transport)).with_timeout(timeout))
    }

    pub fn new_with_transport(base_url: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: None,
            default_headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            timeout: DEFAULT_TIMEOUT,
            rate_limiter: None,
            read_only: false,
        }
    }

    /// Return a copy of this client that authorizes every call.
    #[must_use]
    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Option<ApiRateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Set (or replace) a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Return a copy of this client that refuses POST and DELETE without
    /// sending them. Dry runs use it after logging in.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Absolute URL for an API path (which may carry a query string).
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request and map the outcome.
    ///
    /// Every call is bounded by the client timeout regardless of transport.
    /// There are no retries.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        extra_headers: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse, ApiError> {
        if self.read_only && method.is_mutating() {
            return Err(ApiError::ReadOnly {
                method: method.to_string(),
                path: path.to_string(),
            });
        }

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut headers = self.default_headers.clone();
        if let Some(ref auth) = self.authorization {
            headers.push(("Authorization".to_string(), auth.header_value()));
        }
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        for (k, v) in extra_headers {
            headers.push((k.to_string(), v.to_string()));
        }

        let request = HttpRequest {
            method,
            url: self.url(path),
            headers,
            body: body.unwrap_or_default(),
        };

        tracing::trace!(method = method.as_str(), url = %request.url, "Sending request");

        let timeout_secs = self.timeout.as_secs();
        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
        {
            Ok(result) => result.map_err(|e| ApiError::from_http(e, timeout_secs))?,
            Err(_) => return Err(ApiError::Timeout { secs: timeout_secs }),
        };

        if response.is_success() {
            return Ok(response);
        }

        match response.status {
            401 => Err(ApiError::Unauthorized {
                status: response.status,
                body: response.body_text(),
            }),
            status => Err(ApiError::Status {
                status,
                body: response.body_text(),
            }),
        }
    }

    /// GET and decode a JSON body. Returns the response for header access.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<(T, HttpResponse), ApiError> {
        let response = self
            .execute(HttpMethod::Get, path, extra_headers, None)
            .await?;
        let data = serde_json::from_slice(&response.body)?;
        Ok((data, response))
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = serde_json::to_vec(body)?;
        let response = self
            .execute(HttpMethod::Post, path, &[], Some(payload))
            .await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// DELETE a resource. Any 2xx (usually 204) is success.
    pub async fn delete(&self, path: &str) -> Result<u16, ApiError> {
        let response = self.execute(HttpMethod::Delete, path, &[], None).await?;
        Ok(response.status)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authorization", &self.authorization)
            .field("timeout", &self.timeout)
            .field("rate_limiter", &self.rate_limiter)
            .field("read_only", &self.read_only)
            .finish()
    }
}
