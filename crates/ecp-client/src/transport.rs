//! HTTP transport and exchange adapter.
//!
//! [`HttpTransport`] is the seam to the network: one request in, one response
//! out, nothing else. [`HttpExchange`] sits on top and adds what every ECP
//! call needs: session cookies merged into the `Cookie` header, a
//! `User-Agent`, and a per-call timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::HttpConfig;
use crate::cookie::SessionCookies;
use crate::error::EcpResult;

/// Headers whose values never appear in logs.
const SENSITIVE_HEADERS: [&str; 2] = ["authorization", "cookie"];

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl Method {
    /// Method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// An outgoing request.
#[derive(Clone)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Body, if any.
    pub body: Option<Vec<u8>>,
    /// Overrides the configured request timeout.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body and its content type.
    #[must_use]
    pub fn body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body.into());
        self
    }

    /// Adds HTTP Basic credentials.
    #[must_use]
    pub fn basic_auth(self, principal: &str, secret: &str) -> Self {
        let token = STANDARD.encode(format!("{principal}:{secret}"));
        self.header("Authorization", format!("Basic {token}"))
    }

    /// Sets a per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// First value of a header, compared case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn take_header(&mut self, name: &str) -> Option<String> {
        let index = self
            .headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(index).1)
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if SENSITIVE_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    "[REDACTED]"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Headers in received order; repeated headers appear repeatedly.
    pub headers: Vec<(String, String)>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response without headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a header.
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Type`, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one HTTP request.
///
/// Implementations perform no retries and follow no redirects.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and reads the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EcpError::Transport`] on connection failure, timeout or an
    /// unreadable response.
    async fn send(&self, request: HttpRequest) -> EcpResult<HttpResponse>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(config: &HttpConfig) -> EcpResult<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(config.idle_timeout)
            .read_timeout(config.idle_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> EcpResult<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Protocol conveniences over an [`HttpTransport`].
#[derive(Clone)]
pub struct HttpExchange {
    transport: Arc<dyn HttpTransport>,
    config: HttpConfig,
}

impl HttpExchange {
    /// Wraps a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, config: HttpConfig) -> Self {
        Self { transport, config }
    }

    /// HTTP settings.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Sends a request with the session cookies attached.
    ///
    /// A `Cookie` header already on the request is kept and placed after
    /// the session cookies. Neither the request nor `cookies` is modified.
    ///
    /// # Errors
    ///
    /// Propagates transport errors unchanged.
    pub async fn send(
        &self,
        request: &HttpRequest,
        cookies: &SessionCookies,
    ) -> EcpResult<HttpResponse> {
        let mut outgoing = request.clone();
        let caller_cookie = outgoing.take_header("Cookie");
        if let Some(cookie) = cookies.merged_with(caller_cookie.as_deref()) {
            outgoing.headers.push(("Cookie".to_string(), cookie));
        }
        if outgoing.header_value("User-Agent").is_none() {
            outgoing
                .headers
                .push(("User-Agent".to_string(), self.config.user_agent.clone()));
        }
        if outgoing.timeout.is_none() {
            outgoing.timeout = Some(self.config.request_timeout);
        }

        tracing::debug!(
            method = outgoing.method.as_str(),
            url = %outgoing.url,
            "Sending request"
        );
        tracing::trace!(request = ?outgoing, "Request details");

        let response = self.transport.send(outgoing).await.map_err(|err| {
            tracing::warn!(url = %request.url, error = %err, "Request failed");
            err
        })?;

        tracing::debug!(
            url = %request.url,
            status = response.status,
            bytes = response.body.len(),
            "Received response"
        );
        Ok(response)
    }
}

impl fmt::Debug for HttpExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpExchange")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
